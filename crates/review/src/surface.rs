//! Capabilities the review engine needs from the host's editing surface.
//!
//! The host supplies adapters implementing these traits. The engine never
//! renders anything itself; it only reads layout, replaces text and asks
//! the surface to rebuild its chunk highlighting.

use log::debug;
use std::ops::Range;

use buffer_diff::ChunkSet;

use crate::error::SurfaceError;

/// A cursor (`anchor == head`) or a selected range, in chars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// A collapsed selection at `offset`
    pub fn cursor(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_cursor(&self) -> bool {
        self.anchor == self.head
    }

    /// The selected range, smallest offset first
    pub fn range(&self) -> Range<usize> {
        self.anchor.min(self.head)..self.anchor.max(self.head)
    }
}

/// Scroll position of a surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub top: f32,
    pub left: f32,
}

impl ScrollOffset {
    pub fn new(top: f32, left: f32) -> Self {
        Self { top, left }
    }
}

/// Vertical layout of a text surface
pub trait LayoutQuery {
    /// Top of the line holding `char_offset`, in document coordinates.
    /// `None` when the position is not laid out.
    fn line_top(&self, char_offset: usize) -> Option<f32>;

    /// Current vertical scroll, in document coordinates
    fn scroll_top(&self) -> f32;

    /// Height of the visible area
    fn viewport_height(&self) -> f32;
}

/// A mutable text buffer shown to the user.
///
/// The host forwards the surface's change notifications to
/// `DiffSession::on_edit`. Edits the session makes through `replace_range`
/// are already recorded, so an echoed notification is a no-op.
pub trait EditingSurface: LayoutQuery {
    fn text(&self) -> String;

    fn replace_range(&mut self, range: Range<usize>, text: &str) -> Result<(), SurfaceError>;

    fn selection(&self) -> Selection;

    fn set_selection(&mut self, selection: Selection) -> Result<(), SurfaceError>;

    fn scroll_offset(&self) -> ScrollOffset;

    fn set_scroll_offset(&mut self, offset: ScrollOffset) -> Result<(), SurfaceError>;

    /// Throw away the chunk highlighting and build it again from `chunks`
    fn rebuild_highlights(&mut self, chunks: &ChunkSet) -> Result<(), SurfaceError>;
}

/// Cursor, selection and scroll position carried across a rebuild
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub selection: Selection,
    pub scroll: ScrollOffset,
}

impl ViewState {
    pub fn capture<S: EditingSurface + ?Sized>(surface: &S) -> Self {
        Self {
            selection: surface.selection(),
            scroll: surface.scroll_offset(),
        }
    }

    /// Put the view state back. Best effort: a position that no longer
    /// exists is skipped, never reported.
    pub fn restore<S: EditingSurface + ?Sized>(&self, surface: &mut S) -> usize {
        let mut failures = 0;

        if let Err(err) = surface.set_selection(self.selection) {
            debug!("Selection not restored: {}", err);
            failures += 1;
        }
        if let Err(err) = surface.set_scroll_offset(self.scroll) {
            debug!("Scroll offset not restored: {}", err);
            failures += 1;
        }

        failures
    }
}
