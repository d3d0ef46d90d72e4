use derive_more::Display;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a chunk does to the baseline text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChunkKind {
    /// Text that only exists in the working copy
    #[display(fmt = "Insertion")]
    Insertion,

    /// Text that only exists in the baseline
    #[display(fmt = "Deletion")]
    Deletion,

    /// Text present on both sides but different
    #[display(fmt = "Modification")]
    Modification,
}

/// Key used to correlate a chunk across recomputations.
///
/// Only the baseline-side range takes part, so a chunk keeps its identity
/// while the working text around it moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display(fmt = "{}..{}", from_a, to_a)]
pub struct ChunkIdentity {
    /// Start of the baseline range (chars)
    pub from_a: usize,

    /// End of the baseline range (chars, exclusive)
    pub to_a: usize,
}

impl ChunkIdentity {
    pub fn new(from_a: usize, to_a: usize) -> Self {
        Self { from_a, to_a }
    }
}

/// A differing region between the baseline (`a`) and the working text (`b`).
///
/// Both ranges are half-open and measured in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display(fmt = "-[{}..{}) +[{}..{})", from_a, to_a, from_b, to_b)]
pub struct Chunk {
    /// Start of the range in the baseline
    pub from_a: usize,

    /// End of the range in the baseline (exclusive)
    pub to_a: usize,

    /// Start of the range in the working text
    pub from_b: usize,

    /// End of the range in the working text (exclusive)
    pub to_b: usize,
}

impl Chunk {
    /// Create a chunk from its four offsets
    pub fn new(from_a: usize, to_a: usize, from_b: usize, to_b: usize) -> Self {
        Self {
            from_a,
            to_a,
            from_b,
            to_b,
        }
    }

    /// Create a chunk from a baseline range and a working range
    pub fn from_ranges(a: Range<usize>, b: Range<usize>) -> Self {
        Self::new(a.start, a.end, b.start, b.end)
    }

    /// The baseline-side range
    pub fn range_a(&self) -> Range<usize> {
        self.from_a..self.to_a
    }

    /// The working-side range
    pub fn range_b(&self) -> Range<usize> {
        self.from_b..self.to_b
    }

    pub fn len_a(&self) -> usize {
        self.to_a.saturating_sub(self.from_a)
    }

    pub fn len_b(&self) -> usize {
        self.to_b.saturating_sub(self.from_b)
    }

    /// The identity this chunk is tracked under
    pub fn identity(&self) -> ChunkIdentity {
        ChunkIdentity::new(self.from_a, self.to_a)
    }

    /// Classify the chunk by which sides are empty
    pub fn kind(&self) -> ChunkKind {
        if self.len_a() == 0 {
            ChunkKind::Insertion
        } else if self.len_b() == 0 {
            ChunkKind::Deletion
        } else {
            ChunkKind::Modification
        }
    }

    /// Same baseline range, different working range
    pub fn with_range_b(&self, b: Range<usize>) -> Self {
        Self::new(self.from_a, self.to_a, b.start, b.end)
    }
}
