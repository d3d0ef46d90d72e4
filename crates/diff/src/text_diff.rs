use anyhow::{Context, Result};
use similar::{Algorithm, DiffTag, TextDiff as SimilarTextDiff};
use std::ops::Range;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::chunk_set::ChunkSet;

/// Anything that can compute the differing regions between two texts.
///
/// Implementations must be deterministic and free of side effects. The
/// output is validated by the caller before it is trusted.
pub trait ChunkDiffer {
    fn diff(&self, baseline: &str, working: &str) -> Result<Vec<Chunk>>;
}

impl<F> ChunkDiffer for F
where
    F: Fn(&str, &str) -> Result<Vec<Chunk>>,
{
    fn diff(&self, baseline: &str, working: &str) -> Result<Vec<Chunk>> {
        self(baseline, working)
    }
}

/// The unit the diff algorithm compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiffGranularity {
    /// Whole lines, including their terminator
    #[default]
    Line,
    /// Words and the whitespace between them
    Word,
    /// Individual chars
    Char,
}

/// Configuration for the `similar`-backed differ
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiffConfig {
    /// The diff algorithm
    pub algorithm: Algorithm,

    /// What a token is
    pub granularity: DiffGranularity,

    /// Give up on a minimal diff after this long. `None` keeps the output
    /// deterministic.
    pub timeout: Option<Duration>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Myers,
            granularity: DiffGranularity::Line,
            timeout: None,
        }
    }
}

impl DiffConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the diff algorithm
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the token granularity
    pub fn granularity(mut self, granularity: DiffGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Set a deadline for the diff algorithm
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Diff two texts and validate the result
    pub fn diff(&self, baseline: &str, working: &str) -> Result<ChunkSet> {
        let chunks = self.compute_chunks(baseline, working);
        ChunkSet::from_chunks(chunks, baseline.chars().count(), working.chars().count())
            .context("diff produced an invalid chunk set")
    }

    fn compute_chunks(&self, baseline: &str, working: &str) -> Vec<Chunk> {
        let mut config = SimilarTextDiff::configure();
        config.algorithm(self.algorithm);
        if let Some(timeout) = self.timeout {
            config.timeout(timeout);
        }

        let diff = match self.granularity {
            DiffGranularity::Line => config.diff_lines(baseline, working),
            DiffGranularity::Word => config.diff_words(baseline, working),
            DiffGranularity::Char => config.diff_chars(baseline, working),
        };

        // Token index -> char offset, one extra entry for the end
        let old_offsets = char_offsets(diff.old_slices());
        let new_offsets = char_offsets(diff.new_slices());

        let mut chunks = Vec::new();
        let mut pending: Option<(Range<usize>, Range<usize>)> = None;

        // Ops are walked in order and positioned by how many tokens each
        // side has consumed so far. The indices an op reports for the side
        // it leaves untouched do not always match that position.
        let mut old_cursor = 0;
        let mut new_cursor = 0;

        for op in diff.ops() {
            let (tag, old, new) = op.as_tag_tuple();
            let a = old_cursor..old_cursor + old.len();
            let b = new_cursor..new_cursor + new.len();
            old_cursor = a.end;
            new_cursor = b.end;

            if tag == DiffTag::Equal {
                if let Some((a, b)) = pending.take() {
                    chunks.push(to_chunk(&old_offsets, &new_offsets, a, b));
                }
                continue;
            }

            // Consecutive deletes and inserts form a single chunk
            pending = Some(match pending {
                None => (a, b),
                Some((start_a, start_b)) => (start_a.start..a.end, start_b.start..b.end),
            });
        }

        if let Some((a, b)) = pending {
            chunks.push(to_chunk(&old_offsets, &new_offsets, a, b));
        }

        chunks
    }
}

impl ChunkDiffer for DiffConfig {
    fn diff(&self, baseline: &str, working: &str) -> Result<Vec<Chunk>> {
        Ok(self.compute_chunks(baseline, working))
    }
}

fn char_offsets(tokens: &[&str]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(tokens.len() + 1);
    let mut total = 0;
    offsets.push(total);
    for token in tokens {
        total += token.chars().count();
        offsets.push(total);
    }
    offsets
}

fn to_chunk(old_offsets: &[usize], new_offsets: &[usize], a: Range<usize>, b: Range<usize>) -> Chunk {
    Chunk::new(
        old_offsets[a.start],
        old_offsets[a.end],
        new_offsets[b.start],
        new_offsets[b.end],
    )
}

/// Shortcuts over the default configuration
pub struct TextDiff;

impl TextDiff {
    /// Diff two texts line by line with Myers
    pub fn diff(baseline: &str, working: &str) -> Result<ChunkSet> {
        DiffConfig::default().diff(baseline, working)
    }

    /// Diff two texts at the given granularity
    pub fn diff_with_granularity(
        baseline: &str,
        working: &str,
        granularity: DiffGranularity,
    ) -> Result<ChunkSet> {
        DiffConfig::default()
            .granularity(granularity)
            .diff(baseline, working)
    }
}
