//! One baseline/working pair under review.
//!
//! A `DiffSession` owns both texts, the current chunk set and the identity
//! bookkeeping across recomputes. Edits replace the working snapshot and
//! arm the rebuild scheduler; the diff itself only runs when the host
//! calls `tick` after the quiet period, or `flush`.

use log::{debug, info, trace, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use buffer_diff::{ChunkDiffer, ChunkIdentity, ChunkSet, TextSnapshot};

use crate::clock::{Clock, SystemClock};
use crate::edits::{map_through, EditDelta};
use crate::error::{ReviewError, StaleTarget};
use crate::identity::IdentityDiff;
use crate::ids::{GroupId, SessionId};
use crate::options::SessionOptions;
use crate::overlay::{OverlayControl, OverlayEvent, OverlayRenderer};
use crate::scheduler::RebuildScheduler;
use crate::surface::{EditingSurface, LayoutQuery, ViewState};

/// Observable state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Working text equals the baseline
    Clean,
    /// Working text differs from the baseline
    Dirty,
    /// Accepted, rejected or closed; every operation is a no-op
    Disposed,
}

/// Result of a single-chunk revert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertOutcome {
    Applied,
    /// The chunk no longer exists where it was; nothing happened
    Stale,
}

/// Output of one recompute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recomputed {
    pub chunks: ChunkSet,
    pub identities: IdentityDiff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEventKind {
    /// Something changed; carries the pending state at the time
    Changed { pending: bool },
    Disposed,
}

/// Notification sent to whoever aggregates sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub group: GroupId,
    pub session: SessionId,
    pub kind: SessionEventKind,
}

/// Where a session reports its events
#[derive(Debug, Clone)]
pub struct EventSink {
    group: GroupId,
    tx: Sender<SessionEvent>,
}

impl EventSink {
    pub fn new(group: GroupId, tx: Sender<SessionEvent>) -> Self {
        Self { group, tx }
    }
}

type DocumentWriter = Box<dyn FnMut(&str) -> anyhow::Result<()>>;

/// Builder for a `DiffSession`
pub struct SessionBuilder {
    id: SessionId,
    baseline: String,
    working: String,
    options: SessionOptions,
    differ: Option<Box<dyn ChunkDiffer>>,
    clock: Option<Rc<dyn Clock>>,
}

impl SessionBuilder {
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a differ other than the one configured in the options
    pub fn differ(mut self, differ: impl ChunkDiffer + 'static) -> Self {
        self.differ = Some(Box::new(differ));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Rc::new(clock));
        self
    }

    /// Create the session and compute its first chunk set
    pub fn build(self) -> DiffSession {
        let differ = self
            .differ
            .unwrap_or_else(|| Box::new(self.options.diff.clone()));
        let clock = self.clock.unwrap_or_else(|| Rc::new(SystemClock));

        let mut session = DiffSession {
            id: self.id,
            baseline: TextSnapshot::new(&self.baseline),
            working: TextSnapshot::new(&self.working),
            chunks: ChunkSet::empty(),
            baseline_generation: 0,
            chunks_generation: 0,
            resolved: BTreeSet::new(),
            edits: Vec::new(),
            differ,
            scheduler: RebuildScheduler::new(self.options.quiet_period),
            clock,
            overlay: OverlayRenderer::new(self.options.anchor_mode),
            surface: None,
            baseline_layout: None,
            document_writer: None,
            events: None,
            disposed: false,
            options: self.options,
        };

        if let Err(err) = session.recompute() {
            warn!("Initial diff for session {} failed: {}", session.id, err);
        }
        info!(
            "Created diff session {} with {} chunks",
            session.id,
            session.chunks.len()
        );

        session
    }
}

/// A baseline text, a live working text, and the chunks between them
pub struct DiffSession {
    id: SessionId,
    baseline: TextSnapshot,
    working: TextSnapshot,
    chunks: ChunkSet,
    /// Bumped whenever the baseline is replaced
    baseline_generation: u64,
    /// Baseline generation the current chunks were computed against
    chunks_generation: u64,
    /// Chunks actioned since the last recompute
    resolved: BTreeSet<ChunkIdentity>,
    /// Working-text edits since the last recompute, oldest first
    edits: Vec<EditDelta>,
    differ: Box<dyn ChunkDiffer>,
    scheduler: RebuildScheduler,
    clock: Rc<dyn Clock>,
    overlay: OverlayRenderer,
    surface: Option<Box<dyn EditingSurface>>,
    baseline_layout: Option<Box<dyn LayoutQuery>>,
    document_writer: Option<DocumentWriter>,
    events: Option<EventSink>,
    disposed: bool,
    options: SessionOptions,
}

impl fmt::Debug for DiffSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffSession")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("chunks", &self.chunks)
            .field("resolved", &self.resolved)
            .field("pending_rebuild", &self.scheduler.is_pending())
            .finish_non_exhaustive()
    }
}

impl DiffSession {
    /// Start building a session over `baseline` and `working`
    pub fn builder(id: impl Into<SessionId>, baseline: &str, working: &str) -> SessionBuilder {
        SessionBuilder {
            id: id.into(),
            baseline: baseline.to_string(),
            working: working.to_string(),
            options: SessionOptions::default(),
            differ: None,
            clock: None,
        }
    }

    /// A session with default options
    pub fn new(id: impl Into<SessionId>, baseline: &str, working: &str) -> Self {
        Self::builder(id, baseline, working).build()
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn baseline(&self) -> &TextSnapshot {
        &self.baseline
    }

    pub fn working(&self) -> &TextSnapshot {
        &self.working
    }

    /// The chunk set from the last successful recompute
    pub fn chunks(&self) -> &ChunkSet {
        &self.chunks
    }

    /// Chunks reverted since the last recompute
    pub fn resolved(&self) -> &BTreeSet<ChunkIdentity> {
        &self.resolved
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn overlay(&self) -> &OverlayRenderer {
        &self.overlay
    }

    pub fn controls(&self) -> &[OverlayControl] {
        self.overlay.controls()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn status(&self) -> SessionStatus {
        if self.disposed {
            SessionStatus::Disposed
        } else if self.working == self.baseline {
            SessionStatus::Clean
        } else {
            SessionStatus::Dirty
        }
    }

    /// Whether the working text differs from the baseline. Always a fresh
    /// content comparison; a disposed session has nothing pending.
    pub fn has_pending_changes(&self) -> bool {
        !self.disposed && self.working != self.baseline
    }

    /// Whether a debounced rebuild is waiting for its quiet period
    pub fn has_pending_rebuild(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn rebuild_count(&self) -> u64 {
        self.scheduler.rebuild_count()
    }

    /// Attach the surface showing the working text.
    ///
    /// If the surface already diverged from the session, its text wins and
    /// is treated as an edit.
    pub fn attach_surface(&mut self, surface: Box<dyn EditingSurface>) {
        if self.disposed {
            return;
        }

        let text = surface.text();
        self.surface = Some(surface);
        if !self.working.eq_str(&text) {
            debug!("Surface of session {} diverged, adopting its text", self.id);
            self.on_edit(&text);
        }

        self.refresh_surface();
        self.project(OverlayEvent::ChunksChanged(self.chunks.clone()));
    }

    pub fn detach_surface(&mut self) -> Option<Box<dyn EditingSurface>> {
        let surface = self.surface.take();
        self.project(OverlayEvent::LayoutChanged);
        surface
    }

    /// Attach the layout of the surface showing the baseline
    pub fn attach_baseline_layout(&mut self, layout: Box<dyn LayoutQuery>) {
        if self.disposed {
            return;
        }
        self.baseline_layout = Some(layout);
        self.project(OverlayEvent::LayoutChanged);
    }

    /// Callback that writes the accepted text to the host document
    pub fn set_document_writer<F>(&mut self, writer: F)
    where
        F: FnMut(&str) -> anyhow::Result<()> + 'static,
    {
        self.document_writer = Some(Box::new(writer));
    }

    /// Report events to `sink` from now on
    pub fn attach_events(&mut self, sink: EventSink) {
        self.events = Some(sink);
    }

    /// The working text changed on the surface.
    ///
    /// Only arms the scheduler; the diff runs later.
    pub fn on_edit(&mut self, text: &str) {
        if self.disposed {
            return;
        }

        let next = TextSnapshot::new(text);
        let Some(delta) = EditDelta::between(self.working.rope(), next.rope()) else {
            trace!("Session {} saw an edit with no change", self.id);
            return;
        };

        trace!("Session {} edit {:?}", self.id, delta);
        self.edits.push(delta);
        self.working = next;
        self.scheduler.schedule(self.clock.now());
        self.emit_changed();
    }

    /// Copy the baseline text of a chunk back over its working range.
    ///
    /// A chunk that was already reverted, disappeared, or was overtaken by
    /// an edit is a stale reference and the call does nothing.
    pub fn revert_chunk(&mut self, identity: ChunkIdentity) -> RevertOutcome {
        if self.disposed {
            return RevertOutcome::Stale;
        }

        let (range_b, text) = match self.resolve_chunk(identity) {
            Ok(resolved) => resolved,
            Err(err) => {
                debug!("Session {}: revert skipped, {}", self.id, err);
                return RevertOutcome::Stale;
            }
        };

        let next = match self.working.replace(range_b.clone(), &text) {
            Ok(next) => next,
            Err(err) => {
                debug!("Session {}: revert skipped, {}", self.id, err);
                return RevertOutcome::Stale;
            }
        };

        if !self.write_surface(range_b.clone(), &text, false) {
            debug!("Session {}: revert of {} not applied to the surface", self.id, identity);
            return RevertOutcome::Stale;
        }
        self.edits
            .push(EditDelta::replacing(range_b, text.chars().count()));
        self.working = next;
        self.resolved.insert(identity);
        self.scheduler.schedule(self.clock.now());

        debug!("Session {} reverted chunk {}", self.id, identity);
        self.project(OverlayEvent::LayoutChanged);
        self.emit_changed();
        RevertOutcome::Applied
    }

    /// Where the chunk sits in the working text now, and its baseline text
    fn resolve_chunk(&self, identity: ChunkIdentity) -> Result<(Range<usize>, String), ReviewError> {
        let stale = || ReviewError::StaleReference(StaleTarget::Chunk(identity));

        if self.resolved.contains(&identity) || self.chunks_generation != self.baseline_generation {
            return Err(stale());
        }

        let chunk = self.chunks.get(identity).ok_or_else(stale)?;
        let range_b = map_through(&self.edits, chunk.range_b()).ok_or_else(stale)?;
        if range_b.end > self.working.len_chars() {
            return Err(stale());
        }

        let text = self.baseline.slice(chunk.range_a()).map_err(|_| stale())?;
        Ok((range_b, text))
    }

    /// Keep the working text: write it to the host document, make it the
    /// baseline and dispose the session.
    ///
    /// A failing document write is reported and leaves the session as it was.
    pub fn accept_all(&mut self) -> Result<(), ReviewError> {
        if self.disposed {
            return Ok(());
        }

        if let Some(writer) = self.document_writer.as_mut() {
            let text = self.working.to_string();
            if let Err(err) = writer(&text) {
                warn!("Session {}: document write failed: {:#}", self.id, err);
                return Err(ReviewError::DocumentWrite(err));
            }
        }

        self.baseline = self.working.clone();
        self.baseline_generation += 1;
        self.finish_resolution();

        info!("Session {} accepted", self.id);
        Ok(())
    }

    /// Drop every change: the working text becomes the baseline again and
    /// the session is disposed.
    ///
    /// If the surface refuses the edit nothing changes and the session
    /// stays active.
    pub fn reject_all(&mut self) {
        if self.disposed {
            return;
        }

        let len = self.working.len_chars();
        let text = self.baseline.to_string();
        if !self.write_surface(0..len, &text, true) {
            warn!("Session {}: reject skipped, surface kept its text", self.id);
            return;
        }
        self.edits
            .push(EditDelta::replacing(0..len, self.baseline.len_chars()));
        self.working = self.baseline.clone();
        self.finish_resolution();

        info!("Session {} rejected", self.id);
    }

    /// Dispose without touching either text
    pub fn close(&mut self) {
        if self.disposed {
            return;
        }
        self.scheduler.cancel();
        self.dispose();
    }

    /// Replace the baseline; every chunk identity is invalidated
    pub fn replace_baseline(&mut self, text: &str) {
        if self.disposed || self.baseline.eq_str(text) {
            return;
        }

        self.baseline = TextSnapshot::new(text);
        self.baseline_generation += 1;
        self.scheduler.schedule(self.clock.now());
        self.emit_changed();
    }

    /// Run the differ against the current texts and swap in the result.
    ///
    /// On failure the previous chunk set stays in place.
    pub fn recompute(&mut self) -> Result<Recomputed, ReviewError> {
        if self.disposed {
            return Ok(Recomputed {
                chunks: self.chunks.clone(),
                identities: IdentityDiff::default(),
            });
        }

        let baseline = self.baseline.to_string();
        let working = self.working.to_string();

        let raw = self
            .differ
            .diff(&baseline, &working)
            .map_err(ReviewError::PrimitiveFailure)?;
        let next = ChunkSet::from_chunks(raw, self.baseline.len_chars(), self.working.len_chars())
            .map_err(|err| {
                ReviewError::PrimitiveFailure(
                    anyhow::Error::new(err).context("differ returned a malformed chunk set"),
                )
            })?;

        let same_baseline = self.chunks_generation == self.baseline_generation;
        let identities = IdentityDiff::reconcile(&self.chunks, &next, same_baseline);

        if identities.is_unchanged() {
            trace!("Session {} recomputed, same {} chunks", self.id, identities.retained.len());
        } else {
            debug!(
                "Session {} recomputed: +{} -{} ={}",
                self.id,
                identities.added.len(),
                identities.removed.len(),
                identities.retained.len()
            );
        }

        self.chunks = next;
        self.chunks_generation = self.baseline_generation;
        self.edits.clear();
        self.resolved.clear();

        Ok(Recomputed {
            chunks: self.chunks.clone(),
            identities,
        })
    }

    /// Run the debounced rebuild if its quiet period has elapsed
    pub fn tick(&mut self) -> Result<Option<Recomputed>, ReviewError> {
        if self.disposed || !self.scheduler.take_due(self.clock.now()) {
            return Ok(None);
        }
        self.rebuild()
    }

    /// Rebuild right now, cancelling any pending debounce
    pub fn flush(&mut self) -> Result<Option<Recomputed>, ReviewError> {
        if self.disposed {
            return Ok(None);
        }
        self.scheduler.cancel();
        self.rebuild()
    }

    /// The working surface scrolled
    pub fn on_scroll(&mut self) -> &[OverlayControl] {
        self.project(OverlayEvent::Scrolled);
        self.overlay.controls()
    }

    /// Either surface re-laid out its lines
    pub fn on_layout_changed(&mut self) -> &[OverlayControl] {
        self.project(OverlayEvent::LayoutChanged);
        self.overlay.controls()
    }

    fn rebuild(&mut self) -> Result<Option<Recomputed>, ReviewError> {
        if !self.scheduler.begin() {
            return Ok(None);
        }

        let result = self.recompute();
        match &result {
            Ok(recomputed) => {
                self.refresh_surface();
                self.project(OverlayEvent::ChunksChanged(recomputed.chunks.clone()));
            }
            Err(err) => warn!("Session {}: rebuild failed, keeping previous chunks: {}", self.id, err),
        }

        self.scheduler.finish(self.clock.now());
        self.emit_changed();
        result.map(Some)
    }

    /// Rebuild the surface highlighting, keeping the user's view in place
    fn refresh_surface(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        let view = ViewState::capture(&**surface);
        if let Err(err) = surface.rebuild_highlights(&self.chunks) {
            warn!("Session {}: highlight rebuild failed: {}", self.id, err);
        }
        view.restore(&mut **surface);
    }

    /// Apply an edit the session makes to the attached surface. Returns
    /// false if the surface rejected it; the session must then leave its
    /// own text alone.
    fn write_surface(&mut self, range: Range<usize>, text: &str, preserve_view: bool) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return true;
        };

        let view = ViewState::capture(&**surface);
        if let Err(err) = surface.replace_range(range, text) {
            warn!("Session {}: surface edit failed: {}", self.id, err);
            return false;
        }
        if preserve_view {
            view.restore(&mut **surface);
        }
        true
    }

    fn project(&mut self, event: OverlayEvent) {
        self.overlay.handle(
            event,
            &self.resolved,
            self.surface.as_deref(),
            self.baseline_layout.as_deref(),
        );
    }

    /// Final recompute before disposal
    fn finish_resolution(&mut self) {
        if let Err(err) = self.flush() {
            warn!("Session {}: final rebuild failed: {}", self.id, err);
        }
        self.dispose();
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.overlay.clear();
        self.surface = None;
        self.baseline_layout = None;
        self.edits.clear();
        self.resolved.clear();

        info!("Disposed diff session {}", self.id);
        self.emit(SessionEventKind::Disposed);
        self.events = None;
    }

    fn emit_changed(&self) {
        self.emit(SessionEventKind::Changed {
            pending: self.has_pending_changes(),
        });
    }

    fn emit(&self, kind: SessionEventKind) {
        let Some(sink) = &self.events else {
            return;
        };

        let event = SessionEvent {
            group: sink.group.clone(),
            session: self.id.clone(),
            kind,
        };
        if sink.tx.send(event).is_err() {
            trace!("Session {}: event receiver is gone", self.id);
        }
    }
}
