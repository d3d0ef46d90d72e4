mod common;

use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

use buffer_diff::{ChunkIdentity, ChunkKind, TextDiff};
use common::{MockLayout, MockSurface};
use diff_review::{
    AnchorMode, ChunkAction, DiffSession, OverlayEvent, OverlayRenderer, RevertOutcome,
    ScrollOffset, SessionOptions,
};

fn session_with_surfaces(baseline: &str, working: &str, mode: AnchorMode) -> (DiffSession, MockSurface) {
    let mut session = DiffSession::builder("cell", baseline, working)
        .options(SessionOptions::new().anchor_mode(mode))
        .build();
    let surface = MockSurface::new(working);
    session.attach_surface(surface.boxed());
    session.attach_baseline_layout(Box::new(MockLayout::new(baseline)));
    (session, surface)
}

#[test]
fn test_midpoint_anchor() {
    let (session, _surface) = session_with_surfaces("a\nb\nc\n", "a\nX\nc\n", AnchorMode::Midpoint);

    let controls = session.controls();
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0].identity, ChunkIdentity::new(2, 4));
    assert_eq!(controls[0].kind, ChunkKind::Modification);
    assert_eq!(controls[0].action, ChunkAction::Revert);
    // Line 2 spans 20..40 on both sides
    assert_eq!(controls[0].top, 30.0);
}

#[test]
fn test_midpoint_between_offset_blocks() {
    let mut session = DiffSession::new("cell", "a\nb\nc\n", "a\nX\nc\n");
    session.attach_surface(MockSurface::new("a\nX\nc\n").boxed());
    let mut baseline = MockLayout::new("a\nb\nc\n");
    baseline.scroll_top = 10.0;
    session.attach_baseline_layout(Box::new(baseline));

    assert_eq!(session.controls()[0].top, 25.0);
}

#[test]
fn test_working_line_top_anchor() {
    let (session, _surface) = session_with_surfaces("a\nb\nc\n", "a\nX\nc\n", AnchorMode::WorkingLineTop);

    assert_eq!(session.controls()[0].top, 20.0);
}

#[test]
fn test_midpoint_without_baseline_layout() {
    let mut session = DiffSession::new("cell", "a\nb\nc\n", "a\nX\nc\n");
    session.attach_surface(MockSurface::new("a\nX\nc\n").boxed());

    assert_eq!(session.controls()[0].top, 20.0);
}

#[test]
fn test_no_surface_no_controls() {
    let session = DiffSession::new("cell", "a\n", "b\n");

    assert_eq!(session.chunks().len(), 1);
    assert!(session.controls().is_empty());
}

#[test]
fn test_scrolled_out_controls_are_omitted() {
    let (mut session, surface) =
        session_with_surfaces("a\nb\nc\n", "a\nX\nc\n", AnchorMode::WorkingLineTop);
    assert_eq!(session.controls().len(), 1);

    surface.update(|state| state.scroll = ScrollOffset::new(100.0, 0.0));
    assert!(session.on_scroll().is_empty());

    surface.update(|state| state.scroll = ScrollOffset::new(10.0, 0.0));
    let controls = session.on_scroll();
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0].top, 10.0);
}

#[test]
fn test_controls_below_viewport_are_omitted() {
    let baseline: String = (0..40).map(|i| format!("line {}\n", i)).collect();
    let working = baseline.replace("line 3\n", "LINE 3\n").replace("line 30\n", "LINE 30\n");
    let (mut session, surface) = session_with_surfaces(&baseline, &working, AnchorMode::Midpoint);

    assert_eq!(session.chunks().len(), 2);
    // Line 30 sits at 600, past a 400 high viewport
    assert_eq!(session.controls().len(), 1);
    assert_eq!(session.controls()[0].top, 70.0);

    surface.update(|state| state.viewport_height = 800.0);
    assert_eq!(session.on_layout_changed().len(), 2);
}

#[test]
fn test_resolved_chunk_hides_its_control() {
    let (mut session, _surface) =
        session_with_surfaces("a\nb\nc\nd\n", "a\nX\nc\nY\n", AnchorMode::Midpoint);
    assert_eq!(session.controls().len(), 2);

    let first = session.controls()[0].clone();
    assert_eq!(first.invoke(&mut session), RevertOutcome::Applied);

    let remaining: Vec<_> = session.controls().iter().map(|c| c.identity).collect();
    assert_eq!(remaining, vec![ChunkIdentity::new(6, 8)]);

    // A second press on the stale control does nothing
    assert_eq!(first.invoke(&mut session), RevertOutcome::Stale);
    assert_eq!(session.working().to_string(), "a\nb\nc\nY\n");
}

#[test]
fn test_rebuild_reprojects() {
    let (mut session, surface) = session_with_surfaces("a\n", "a\n", AnchorMode::Midpoint);
    assert!(session.controls().is_empty());
    let projections = session.overlay().projection_count();

    let text = surface.type_text("a\nb\n");
    session.on_edit(&text);
    session.flush().unwrap();

    assert!(session.overlay().projection_count() > projections);
    assert_eq!(session.controls().len(), 1);
    assert_eq!(session.controls()[0].kind, ChunkKind::Insertion);
}

#[test]
fn test_disposed_session_has_no_controls() {
    let (mut session, _surface) = session_with_surfaces("a\n", "b\n", AnchorMode::Midpoint);
    assert_eq!(session.controls().len(), 1);

    session.close();

    assert!(session.controls().is_empty());
    assert!(session.overlay().chunks().is_empty());
}

#[test]
fn test_renderer_projection() {
    let chunks = TextDiff::diff("a\nb\nc\n", "a\nc\nd\n").unwrap();
    let layout = MockLayout::new("a\nc\nd\n");
    let mut renderer = OverlayRenderer::new(AnchorMode::WorkingLineTop);

    let controls = renderer.handle(
        OverlayEvent::ChunksChanged(chunks.clone()),
        &BTreeSet::new(),
        Some(&layout),
        None::<&MockLayout>,
    );
    let tops: Vec<_> = controls.iter().map(|c| (c.kind, c.top)).collect();
    assert_eq!(
        tops,
        vec![(ChunkKind::Deletion, 20.0), (ChunkKind::Insertion, 40.0)]
    );

    let resolved: BTreeSet<_> = chunks.identities().take(1).collect();
    let controls = renderer.handle(OverlayEvent::Scrolled, &resolved, Some(&layout), None::<&MockLayout>);
    assert_eq!(controls.len(), 1);
    assert_eq!(renderer.projection_count(), 2);

    let controls = renderer.handle(OverlayEvent::LayoutChanged, &resolved, None::<&MockLayout>, None::<&MockLayout>);
    assert!(controls.is_empty());
    assert_eq!(renderer.chunks(), &chunks);
}
