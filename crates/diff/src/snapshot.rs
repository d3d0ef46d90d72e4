use derive_more::Display;
use ropey::Rope;
use std::fmt;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Failure to address a range inside a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "range {}..{} is outside a text of {} chars", start, end, len)]
pub struct SnapshotError {
    pub start: usize,
    pub end: usize,
    pub len: usize,
}

impl std::error::Error for SnapshotError {}

/// An immutable version of a text document.
///
/// Offsets are char indices. Edits produce a new snapshot; the rope nodes
/// are shared, so keeping old snapshots around is cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub struct TextSnapshot {
    rope: Rope,
}

impl TextSnapshot {
    /// Create a snapshot from a string
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// The underlying rope
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Copy out the text in `range`
    pub fn slice(&self, range: Range<usize>) -> Result<String, SnapshotError> {
        self.rope
            .get_slice(range.clone())
            .map(|slice| slice.to_string())
            .ok_or_else(|| self.range_error(range))
    }

    /// Return a new snapshot with `range` replaced by `text`
    pub fn replace(&self, range: Range<usize>, text: &str) -> Result<Self, SnapshotError> {
        if range.start > range.end || range.end > self.len_chars() {
            return Err(self.range_error(range));
        }

        let mut rope = self.rope.clone();
        rope.try_remove(range.clone())
            .map_err(|_| self.range_error(range.clone()))?;
        rope.try_insert(range.start, text)
            .map_err(|_| self.range_error(range))?;

        Ok(Self { rope })
    }

    /// Line containing the char at `char_idx`
    pub fn char_to_line(&self, char_idx: usize) -> Option<usize> {
        self.rope.try_char_to_line(char_idx).ok()
    }

    /// First char of `line`
    pub fn line_to_char(&self, line: usize) -> Option<usize> {
        self.rope.try_line_to_char(line).ok()
    }

    /// Content equality against a plain string
    pub fn eq_str(&self, text: &str) -> bool {
        self.rope == text
    }

    fn range_error(&self, range: Range<usize>) -> SnapshotError {
        SnapshotError {
            start: range.start,
            end: range.end,
            len: self.len_chars(),
        }
    }
}

impl From<&str> for TextSnapshot {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextSnapshot {
    fn from(text: String) -> Self {
        Self::new(&text)
    }
}

impl From<TextSnapshot> for String {
    fn from(snapshot: TextSnapshot) -> Self {
        snapshot.rope.to_string()
    }
}

impl fmt::Display for TextSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}
