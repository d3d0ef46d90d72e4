use derive_more::Display;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkIdentity};

/// Which text a range refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Side {
    #[display(fmt = "baseline")]
    Baseline,
    #[display(fmt = "working")]
    Working,
}

/// Reasons a list of chunks is rejected as a ChunkSet
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ChunkSetError {
    #[display(fmt = "chunk {} has a reversed range on the {} side", index, side)]
    ReversedRange { index: usize, side: Side },

    #[display(fmt = "chunk {} is empty on both sides", index)]
    EmptyChunk { index: usize },

    #[display(fmt = "chunk {} ends at {} past the {} text length {}", index, end, side, len)]
    OutOfBounds {
        index: usize,
        side: Side,
        end: usize,
        len: usize,
    },

    #[display(fmt = "chunk {} overlaps or precedes chunk {} on the {} side", index, previous, side)]
    Unordered {
        previous: usize,
        index: usize,
        side: Side,
    },

    #[display(fmt = "chunks {} and {} share identity {}", previous, index, identity)]
    DuplicateIdentity {
        previous: usize,
        index: usize,
        identity: ChunkIdentity,
    },
}

impl std::error::Error for ChunkSetError {}

/// An immutable, ordered set of non-overlapping chunks between two texts.
///
/// Cloning is cheap; the chunks are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "Vec<Chunk>", try_from = "Vec<Chunk>"))]
pub struct ChunkSet {
    chunks: Arc<[Chunk]>,
}

impl Default for ChunkSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl ChunkSet {
    /// A set with no chunks
    pub fn empty() -> Self {
        Self {
            chunks: Arc::from(Vec::new()),
        }
    }

    /// Validate `chunks` against the lengths of the two texts they describe
    pub fn from_chunks(chunks: Vec<Chunk>, len_a: usize, len_b: usize) -> Result<Self, ChunkSetError> {
        for (index, chunk) in chunks.iter().enumerate() {
            if chunk.from_a > chunk.to_a {
                return Err(ChunkSetError::ReversedRange {
                    index,
                    side: Side::Baseline,
                });
            }
            if chunk.from_b > chunk.to_b {
                return Err(ChunkSetError::ReversedRange {
                    index,
                    side: Side::Working,
                });
            }
            if chunk.len_a() == 0 && chunk.len_b() == 0 {
                return Err(ChunkSetError::EmptyChunk { index });
            }
            if chunk.to_a > len_a {
                return Err(ChunkSetError::OutOfBounds {
                    index,
                    side: Side::Baseline,
                    end: chunk.to_a,
                    len: len_a,
                });
            }
            if chunk.to_b > len_b {
                return Err(ChunkSetError::OutOfBounds {
                    index,
                    side: Side::Working,
                    end: chunk.to_b,
                    len: len_b,
                });
            }
        }

        for (previous, pair) in chunks.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            let index = previous + 1;
            if prev.to_a > next.from_a {
                return Err(ChunkSetError::Unordered {
                    previous,
                    index,
                    side: Side::Baseline,
                });
            }
            if prev.to_b > next.from_b {
                return Err(ChunkSetError::Unordered {
                    previous,
                    index,
                    side: Side::Working,
                });
            }
            if prev.identity() == next.identity() {
                return Err(ChunkSetError::DuplicateIdentity {
                    previous,
                    index,
                    identity: next.identity(),
                });
            }
        }

        Ok(Self {
            chunks: Arc::from(chunks),
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    pub fn as_slice(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Get a chunk by index
    pub fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    /// Find the chunk tracked under `identity`
    pub fn get(&self, identity: ChunkIdentity) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.identity() == identity)
    }

    pub fn contains(&self, identity: ChunkIdentity) -> bool {
        self.get(identity).is_some()
    }

    /// Identities of all chunks, in order
    pub fn identities(&self) -> impl Iterator<Item = ChunkIdentity> + '_ {
        self.chunks.iter().map(Chunk::identity)
    }

    /// Number of working-side chars covered by chunks
    pub fn inserted_chars(&self) -> usize {
        self.chunks.iter().map(Chunk::len_b).sum()
    }

    /// Number of baseline-side chars covered by chunks
    pub fn deleted_chars(&self) -> usize {
        self.chunks.iter().map(Chunk::len_a).sum()
    }
}

/// Validate chunks whose texts are not at hand. Ordering, emptiness and
/// identities are checked; bounds are not.
impl TryFrom<Vec<Chunk>> for ChunkSet {
    type Error = ChunkSetError;

    fn try_from(chunks: Vec<Chunk>) -> Result<Self, Self::Error> {
        Self::from_chunks(chunks, usize::MAX, usize::MAX)
    }
}

impl From<ChunkSet> for Vec<Chunk> {
    fn from(chunks: ChunkSet) -> Self {
        chunks.chunks.to_vec()
    }
}

impl<'a> IntoIterator for &'a ChunkSet {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

impl fmt::Display for ChunkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chunk) in self.chunks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", chunk)?;
        }
        Ok(())
    }
}
