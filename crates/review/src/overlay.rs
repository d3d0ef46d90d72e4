//! Screen-anchored controls for the chunks of a session.
//!
//! The renderer is a projection: it turns the current chunk set and the
//! layout of both surfaces into a list of positioned controls. It never
//! edits text. A control acts only by calling into `DiffSession`.

use log::trace;
use std::collections::BTreeSet;

use buffer_diff::{Chunk, ChunkIdentity, ChunkKind, ChunkSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::session::{DiffSession, RevertOutcome};
use crate::surface::LayoutQuery;

/// Where a control sits relative to its chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnchorMode {
    /// Halfway between the baseline block and the working block
    #[default]
    Midpoint,
    /// At the top of the working-side block
    WorkingLineTop,
}

/// Things that make the projection stale
#[derive(Debug, Clone)]
pub enum OverlayEvent {
    ChunksChanged(ChunkSet),
    Scrolled,
    LayoutChanged,
}

/// What a control does when invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkAction {
    /// Copy the baseline text back over the chunk
    Revert,
}

/// One positioned control
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayControl {
    pub identity: ChunkIdentity,
    pub kind: ChunkKind,
    /// Offset from the top of the viewport
    pub top: f32,
    pub action: ChunkAction,
}

impl OverlayControl {
    /// Run the control's action against its session
    pub fn invoke(&self, session: &mut DiffSession) -> RevertOutcome {
        match self.action {
            ChunkAction::Revert => session.revert_chunk(self.identity),
        }
    }
}

/// Projects chunks onto anchored controls
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    mode: AnchorMode,
    chunks: ChunkSet,
    controls: Vec<OverlayControl>,
    projections: u64,
}

impl OverlayRenderer {
    pub fn new(mode: AnchorMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> AnchorMode {
        self.mode
    }

    /// Apply an event and project again.
    ///
    /// `resolved` chunks are skipped. Without a working layout there is
    /// nothing to anchor to and no control is produced.
    pub fn handle<W, B>(
        &mut self,
        event: OverlayEvent,
        resolved: &BTreeSet<ChunkIdentity>,
        working: Option<&W>,
        baseline: Option<&B>,
    ) -> &[OverlayControl]
    where
        W: LayoutQuery + ?Sized,
        B: LayoutQuery + ?Sized,
    {
        if let OverlayEvent::ChunksChanged(chunks) = event {
            self.chunks = chunks;
        }

        self.controls.clear();
        self.projections += 1;

        let Some(working) = working else {
            return &self.controls;
        };

        let viewport = working.viewport_height();
        for chunk in self.chunks.iter() {
            if resolved.contains(&chunk.identity()) {
                continue;
            }

            match self.anchor(chunk, working, baseline) {
                Some(top) if (0.0..=viewport).contains(&top) => {
                    self.controls.push(OverlayControl {
                        identity: chunk.identity(),
                        kind: chunk.kind(),
                        top,
                        action: ChunkAction::Revert,
                    });
                }
                // Off screen or not laid out: omitted rather than clamped
                top => trace!("Omitting control for chunk {} (anchor {:?})", chunk, top),
            }
        }

        &self.controls
    }

    fn anchor<W, B>(&self, chunk: &Chunk, working: &W, baseline: Option<&B>) -> Option<f32>
    where
        W: LayoutQuery + ?Sized,
        B: LayoutQuery + ?Sized,
    {
        let working_top = working.line_top(chunk.from_b)? - working.scroll_top();

        match (self.mode, baseline) {
            (AnchorMode::WorkingLineTop, _) | (AnchorMode::Midpoint, None) => Some(working_top),
            (AnchorMode::Midpoint, Some(baseline)) => {
                let working_center = block_center(working, chunk.from_b, chunk.to_b)?;
                let baseline_center = block_center(baseline, chunk.from_a, chunk.to_a)?;
                Some((working_center + baseline_center) / 2.0)
            }
        }
    }

    /// The controls from the last projection
    pub fn controls(&self) -> &[OverlayControl] {
        &self.controls
    }

    pub fn control_for(&self, identity: ChunkIdentity) -> Option<&OverlayControl> {
        self.controls.iter().find(|c| c.identity == identity)
    }

    /// The chunk set the controls were projected from
    pub fn chunks(&self) -> &ChunkSet {
        &self.chunks
    }

    /// Number of projections run so far
    pub fn projection_count(&self) -> u64 {
        self.projections
    }

    pub fn clear(&mut self) {
        self.chunks = ChunkSet::empty();
        self.controls.clear();
    }
}

/// Vertical center of the lines spanning `from..to`, relative to the viewport
fn block_center<L: LayoutQuery + ?Sized>(layout: &L, from: usize, to: usize) -> Option<f32> {
    let top = layout.line_top(from)?;
    // The end may sit past the last laid-out line
    let bottom = layout.line_top(to).unwrap_or(top).max(top);
    Some((top + bottom) / 2.0 - layout.scroll_top())
}
