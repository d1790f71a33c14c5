use std::sync::Arc;

use serde_json::json;
use tfind_engine::config::FindConfig;
use tfind_engine::transcript::Transcript;
use tfind_engine::{
    FindController, FindCoordinator, FindPanel, FindTarget, HighlightKind, PanelId, RenderSurface,
    SearchState,
};
use tfind_tui::cell::CellOptions;
use tfind_tui::{TranscriptView, ViewSurface};
use tfind_types::Event;

fn input(text: &str) -> Event {
    Event::Input {
        input: text.into(),
    }
}

fn tool_call(arguments: &serde_json::Value) -> Event {
    Event::Tool {
        id: "call-1".into(),
        function: "write_file".into(),
        arguments: arguments.as_object().cloned().unwrap_or_default(),
        view: None,
        result: json!("done"),
        error: None,
    }
}

fn write_file(content: &str) -> Event {
    tool_call(&json!({ "content": content }))
}

struct Viewer {
    surface: Arc<ViewSurface>,
    controller: FindController,
}

fn viewer(transcript: Transcript, height: usize, options: CellOptions) -> Viewer {
    let config = FindConfig::default();
    let mut view = TranscriptView::new(transcript.clone(), options);
    view.resize(60, height);
    let surface = ViewSurface::new(view);
    let panel = FindPanel::new(
        PanelId::new("transcript"),
        transcript,
        Arc::clone(&surface) as Arc<dyn RenderSurface>,
        &config,
    );
    let coordinator = FindCoordinator::new();
    coordinator.register(PanelId::new("transcript"), panel as Arc<dyn FindTarget>);
    let controller = FindController::new(coordinator, PanelId::new("transcript"), &config);
    Viewer {
        surface,
        controller,
    }
}

fn all_in_view(surface: &ViewSurface) -> Vec<(usize, usize, usize)> {
    let view = surface.view();
    view.highlights(HighlightKind::All)
        .iter()
        .map(|span| (span.item_index, span.line, span.start))
        .collect()
}

fn current(surface: &ViewSurface) -> Option<(usize, usize, usize)> {
    let view = surface.view();
    view.highlights(HighlightKind::Current)
        .first()
        .map(|span| (span.item_index, span.line, span.start))
}

#[tokio::test]
async fn test_collapsed_arguments_are_skipped() {
    let transcript = Transcript::from_events([
        input("error one"),
        write_file("error in args"),
        input("final error"),
    ]);
    let v = viewer(transcript, 40, CellOptions::default());

    assert_eq!(v.controller.commit("error"), 3);
    assert!(v.controller.go_to_next("error").await);
    assert_eq!(current(&v.surface), Some((0, 1, 2)));

    // The second match lives in collapsed arguments; it lands on the next
    // rendered match instead.
    assert!(v.controller.go_to_next("error").await);
    assert_eq!(current(&v.surface), Some((2, 1, 8)));
    let status = v.controller.status();
    assert_eq!((status.current, status.total), (Some(2), 3));
    assert_eq!(status.state, SearchState::Highlighted);
}

#[tokio::test]
async fn test_expanded_arguments_are_found() {
    let transcript = Transcript::from_events([
        input("error one"),
        write_file("error in args"),
        input("final error"),
    ]);
    let options = CellOptions {
        expand_tool_args: true,
        ..CellOptions::default()
    };
    let v = viewer(transcript, 40, options);

    assert!(v.controller.go_to_next("error").await);
    assert!(v.controller.go_to_next("error").await);
    assert_eq!(current(&v.surface).map(|(item, ..)| item), Some(1));
}

#[tokio::test]
async fn test_navigation_scrolls_offscreen_match_into_view() {
    let mut events = vec![input("the error is here")];
    events.extend((0..30).map(|i| input(&format!("line {i}"))));
    let v = viewer(Transcript::from_events(events), 6, CellOptions::default());
    assert!(v.surface.is_following());
    assert!(!v.surface.visible_window().contains(0));

    assert!(v.controller.go_to_next("error").await);
    assert!(v.surface.visible_window().contains(0));
    assert_eq!(current(&v.surface), Some((0, 1, 6)));
    // The match is far from the bottom, so following stays off.
    assert!(!v.surface.is_following());
    assert!(!v.surface.is_at_bottom());
}

#[tokio::test]
async fn test_summary_labels_never_match() {
    let transcript = Transcript::from_events([
        tool_call(&json!({ "note": "key" })),
        input("args here"),
        input("a key point"),
    ]);
    let v = viewer(transcript, 40, CellOptions::default());

    // "args" and "key" both appear in the collapsed summary row.
    assert_eq!(v.controller.commit("args"), 1);
    assert_eq!(all_in_view(&v.surface), vec![(1, 1, 2)]);

    assert_eq!(v.controller.commit("key"), 2);
    assert_eq!(all_in_view(&v.surface), vec![(2, 1, 4)]);

    // The first match is the collapsed argument value; the current match
    // moves on to the input rather than onto the summary text.
    assert!(v.controller.go_to_next("key").await);
    assert_eq!(current(&v.surface), Some((2, 1, 4)));
    let status = v.controller.status();
    assert_eq!((status.current, status.total), (Some(1), 2));
}
