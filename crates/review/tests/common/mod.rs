#![allow(dead_code)]

use anyhow::anyhow;
use std::cell::{Cell, RefCell};
use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;

use buffer_diff::{Chunk, ChunkDiffer, ChunkSet, DiffConfig};
use diff_review::{
    DiffSession, EditingSurface, LayoutQuery, ManualClock, ScrollOffset, Selection, SessionOptions,
    SurfaceError,
};

pub const QUIET: Duration = Duration::from_millis(300);
pub const LINE_HEIGHT: f32 = 20.0;

/// Top of the line containing `offset`, or None past the end
fn line_top_in(text: &str, offset: usize, line_height: f32) -> Option<f32> {
    if offset > text.chars().count() {
        return None;
    }
    let line = text.chars().take(offset).filter(|c| *c == '\n').count();
    Some(line as f32 * line_height)
}

fn byte_range(text: &str, range: Range<usize>) -> Range<usize> {
    let byte = |char_idx: usize| {
        text.char_indices()
            .nth(char_idx)
            .map(|(byte, _)| byte)
            .unwrap_or(text.len())
    };
    byte(range.start)..byte(range.end)
}

#[derive(Debug, Clone)]
pub struct SurfaceState {
    pub text: String,
    pub selection: Selection,
    pub scroll: ScrollOffset,
    pub viewport_height: f32,
    pub replacements: Vec<(Range<usize>, String)>,
    pub highlight_rebuilds: usize,
    pub highlighted: ChunkSet,
    /// Rebuilding highlights resets the view, like recreating the editor
    pub reset_view_on_rebuild: bool,
    pub fail_highlights: bool,
    pub fail_scroll: bool,
    /// Refuse every text replacement, like a read-only editor
    pub fail_replace: bool,
}

/// In-memory editing surface whose state stays observable after it is
/// boxed and handed to a session
#[derive(Debug, Clone)]
pub struct MockSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl MockSurface {
    pub fn new(text: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(SurfaceState {
                text: text.to_string(),
                selection: Selection::default(),
                scroll: ScrollOffset::default(),
                viewport_height: 400.0,
                replacements: Vec::new(),
                highlight_rebuilds: 0,
                highlighted: ChunkSet::empty(),
                reset_view_on_rebuild: true,
                fail_highlights: false,
                fail_scroll: false,
                fail_replace: false,
            })),
        }
    }

    pub fn boxed(&self) -> Box<dyn EditingSurface> {
        Box::new(self.clone())
    }

    pub fn state(&self) -> std::cell::Ref<'_, SurfaceState> {
        self.state.borrow()
    }

    pub fn update(&self, f: impl FnOnce(&mut SurfaceState)) {
        f(&mut self.state.borrow_mut());
    }

    /// The user typed; returns the new text for `DiffSession::on_edit`
    pub fn type_text(&self, text: &str) -> String {
        self.state.borrow_mut().text = text.to_string();
        text.to_string()
    }

    pub fn current_text(&self) -> String {
        self.state.borrow().text.clone()
    }
}

impl LayoutQuery for MockSurface {
    fn line_top(&self, char_offset: usize) -> Option<f32> {
        line_top_in(&self.state.borrow().text, char_offset, LINE_HEIGHT)
    }

    fn scroll_top(&self) -> f32 {
        self.state.borrow().scroll.top
    }

    fn viewport_height(&self) -> f32 {
        self.state.borrow().viewport_height
    }
}

impl EditingSurface for MockSurface {
    fn text(&self) -> String {
        self.current_text()
    }

    fn replace_range(&mut self, range: Range<usize>, text: &str) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        let len = state.text.chars().count();
        if state.fail_replace || range.start > range.end || range.end > len {
            return Err(SurfaceError::OutOfRange {
                position: range.end,
                len,
            });
        }

        let bytes = byte_range(&state.text, range.clone());
        state.text.replace_range(bytes, text);
        state.replacements.push((range, text.to_string()));
        Ok(())
    }

    fn selection(&self) -> Selection {
        self.state.borrow().selection
    }

    fn set_selection(&mut self, selection: Selection) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        let len = state.text.chars().count();
        let position = selection.anchor.max(selection.head);
        if position > len {
            return Err(SurfaceError::OutOfRange { position, len });
        }
        state.selection = selection;
        Ok(())
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.state.borrow().scroll
    }

    fn set_scroll_offset(&mut self, offset: ScrollOffset) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        if state.fail_scroll {
            return Err(SurfaceError::Detached);
        }
        state.scroll = offset;
        Ok(())
    }

    fn rebuild_highlights(&mut self, chunks: &ChunkSet) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        if state.fail_highlights {
            return Err(SurfaceError::Other("highlight layer gone".to_string()));
        }
        state.highlight_rebuilds += 1;
        state.highlighted = chunks.clone();
        if state.reset_view_on_rebuild {
            state.selection = Selection::default();
            state.scroll = ScrollOffset::default();
        }
        Ok(())
    }
}

/// Read-only layout of the baseline side
#[derive(Debug, Clone)]
pub struct MockLayout {
    pub text: String,
    pub line_height: f32,
    pub scroll_top: f32,
    pub viewport_height: f32,
}

impl MockLayout {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            line_height: LINE_HEIGHT,
            scroll_top: 0.0,
            viewport_height: 400.0,
        }
    }
}

impl LayoutQuery for MockLayout {
    fn line_top(&self, char_offset: usize) -> Option<f32> {
        line_top_in(&self.text, char_offset, self.line_height)
    }

    fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    fn viewport_height(&self) -> f32 {
        self.viewport_height
    }
}

/// The default differ, counting calls and remembering each working text
#[derive(Debug, Clone, Default)]
pub struct CountingDiffer {
    inner: DiffConfig,
    calls: Rc<Cell<usize>>,
    seen: Rc<RefCell<Vec<String>>>,
}

impl CountingDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.borrow().clone()
    }
}

impl ChunkDiffer for CountingDiffer {
    fn diff(&self, baseline: &str, working: &str) -> anyhow::Result<Vec<Chunk>> {
        self.calls.set(self.calls.get() + 1);
        self.seen.borrow_mut().push(working.to_string());
        ChunkDiffer::diff(&self.inner, baseline, working)
    }
}

/// The default differ until switched to failing
#[derive(Debug, Clone, Default)]
pub struct FailingDiffer {
    failing: Rc<Cell<bool>>,
}

impl FailingDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always() -> Self {
        let differ = Self::default();
        differ.set_failing(true);
        differ
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl ChunkDiffer for FailingDiffer {
    fn diff(&self, baseline: &str, working: &str) -> anyhow::Result<Vec<Chunk>> {
        if self.failing.get() {
            return Err(anyhow!("diff backend unavailable"));
        }
        ChunkDiffer::diff(&DiffConfig::default(), baseline, working)
    }
}

/// Returns chunks that break the ordering invariant
#[derive(Debug, Clone, Copy, Default)]
pub struct MalformedDiffer;

impl ChunkDiffer for MalformedDiffer {
    fn diff(&self, _baseline: &str, _working: &str) -> anyhow::Result<Vec<Chunk>> {
        Ok(vec![Chunk::new(2, 4, 2, 4), Chunk::new(0, 1, 0, 1)])
    }
}

/// A session on a manual clock with a counting differ
pub fn counted_session(baseline: &str, working: &str) -> (DiffSession, ManualClock, CountingDiffer) {
    let clock = ManualClock::new();
    let differ = CountingDiffer::new();
    let session = DiffSession::builder("cell-1", baseline, working)
        .options(SessionOptions::new().quiet_period(QUIET))
        .differ(differ.clone())
        .clock(clock.clone())
        .build();
    (session, clock, differ)
}
