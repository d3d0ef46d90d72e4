use ropey::Rope;
use std::ops::Range;

/// One contiguous change to the working text, in chars.
///
/// `start..old_end` was replaced by `start..new_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDelta {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

impl EditDelta {
    pub fn new(start: usize, old_end: usize, new_end: usize) -> Self {
        Self {
            start,
            old_end,
            new_end,
        }
    }

    /// The replacement of `range` by `inserted_len` chars
    pub fn replacing(range: Range<usize>, inserted_len: usize) -> Self {
        Self::new(range.start, range.end, range.start + inserted_len)
    }

    /// The smallest single edit turning `old` into `new`, found by trimming
    /// the common prefix and suffix. `None` when the texts are equal.
    pub fn between(old: &Rope, new: &Rope) -> Option<Self> {
        let prefix = old
            .chars()
            .zip(new.chars())
            .take_while(|(a, b)| a == b)
            .count();

        let (old_len, new_len) = (old.len_chars(), new.len_chars());
        if prefix == old_len && prefix == new_len {
            return None;
        }

        // The suffix may not reach back into the prefix on either side
        let max_suffix = old_len.min(new_len) - prefix;
        let mut old_rev = old.chars_at(old_len);
        let mut new_rev = new.chars_at(new_len);
        let mut suffix = 0;
        while suffix < max_suffix {
            match (old_rev.prev(), new_rev.prev()) {
                (Some(a), Some(b)) if a == b => suffix += 1,
                _ => break,
            }
        }

        Some(Self::new(prefix, old_len - suffix, new_len - suffix))
    }

    fn is_insertion(&self) -> bool {
        self.start == self.old_end
    }

    /// Where `range` ends up after this edit, or `None` if the edit
    /// changed text inside it.
    pub fn map_range(&self, range: Range<usize>) -> Option<Range<usize>> {
        let touched = if range.is_empty() {
            // Anything at or around an empty range lands in it
            self.start <= range.start && self.old_end >= range.start
        } else if self.is_insertion() {
            self.start > range.start && self.start < range.end
        } else {
            self.start < range.end && self.old_end > range.start
        };
        if touched {
            return None;
        }

        if self.old_end <= range.start {
            let shift = |offset: usize| offset - self.old_end + self.new_end;
            Some(shift(range.start)..shift(range.end))
        } else {
            Some(range)
        }
    }
}

/// Map `range` through `edits` applied in order
pub fn map_through(edits: &[EditDelta], range: Range<usize>) -> Option<Range<usize>> {
    edits
        .iter()
        .try_fold(range, |range, edit| edit.map_range(range))
}
