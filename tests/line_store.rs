use crossline::editor::store::{StateStore, LINE_KEY, PARAMS_KEY};
use crossline::editor::{Line, LineEditor, SurfacePoint, SurfaceSize, ToleranceBand};
use crossline::stream::ProcessingParams;
use tempfile::tempdir;

fn editor(store: &StateStore) -> LineEditor {
    LineEditor::load(store, SurfaceSize::new(1000.0, 500.0), ToleranceBand::default())
}

#[test]
fn dragged_line_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut store = StateStore::open(&path);
    let mut first = editor(&store);
    assert_eq!(first.line(), Line::default());

    // Endpoint A of the default line sits at (200, 400).
    first.begin_drag(SurfacePoint::new(200.0, 400.0));
    let change = first.update_drag(SurfacePoint::new(100.0, 250.0));
    first.end_drag();
    assert!(change.is_some());
    first.save(&mut store).unwrap();

    let reopened = StateStore::open(&path);
    let second = editor(&reopened);
    assert_eq!(second.line(), Line::new(0.1, 0.5, 0.8, 0.8));
}

#[test]
fn params_and_line_are_independent_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut store = StateStore::open(&path);
    let params = ProcessingParams {
        sample_fps: 8.0,
        workers: 2,
        ..ProcessingParams::default()
    };
    params.save(&mut store).unwrap();
    store.set(LINE_KEY, &"garbage").unwrap();

    let reopened = StateStore::open(&path);
    assert_eq!(ProcessingParams::load(&reopened), params);
    assert_eq!(editor(&reopened).line(), Line::default());

    let mut store = reopened;
    store.set(PARAMS_KEY, &[1, 2, 3]).unwrap();
    store.set(LINE_KEY, &Line::new(0.3, 0.3, 0.6, 0.6)).unwrap();
    let reopened = StateStore::open(&path);
    assert_eq!(ProcessingParams::load(&reopened), ProcessingParams::default());
    assert_eq!(editor(&reopened).line(), Line::new(0.3, 0.3, 0.6, 0.6));
}

#[test]
fn stored_out_of_range_line_is_clamped_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(
        &path,
        r#"{"line":{"x1":-0.5,"y1":0.2,"x2":1.7,"y2":0.4}}"#,
    )
    .unwrap();

    let store = StateStore::open(&path);
    assert_eq!(editor(&store).line(), Line::new(0.0, 0.2, 1.0, 0.4));
}
