use std::collections::BTreeSet;

use buffer_diff::{ChunkIdentity, ChunkSet};

/// How chunk identities changed across one recompute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityDiff {
    /// Chunks that are new in this recompute
    pub added: Vec<ChunkIdentity>,

    /// Chunks that disappeared
    pub removed: Vec<ChunkIdentity>,

    /// Chunks whose baseline range survived unchanged
    pub retained: Vec<ChunkIdentity>,
}

impl IdentityDiff {
    /// Compare the identities of two consecutive chunk sets.
    ///
    /// When the baseline was replaced in between, no identity survives.
    pub fn reconcile(previous: &ChunkSet, next: &ChunkSet, same_baseline: bool) -> Self {
        if !same_baseline {
            return Self {
                added: next.identities().collect(),
                removed: previous.identities().collect(),
                retained: Vec::new(),
            };
        }

        let before: BTreeSet<_> = previous.identities().collect();
        let after: BTreeSet<_> = next.identities().collect();

        Self {
            added: after.difference(&before).copied().collect(),
            removed: before.difference(&after).copied().collect(),
            retained: before.intersection(&after).copied().collect(),
        }
    }

    /// Whether nothing was added or removed
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
