use crate::editor::hit_test::{HitTester, HitZone, ToleranceBand};
use crate::editor::keys::{map_key_event, Direction, KeyAction, KeyEvent};
use crate::editor::model::{
    clamp_point, is_significant_move, to_normalized, Axis, Endpoint, Line, NormPoint,
    SurfacePoint, SurfaceSize,
};
use crate::editor::store::{StateStore, LINE_KEY};
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    #[default]
    None,
    Endpoint(Endpoint),
    SegmentBody,
}

impl From<HitZone> for DragMode {
    fn from(zone: HitZone) -> Self {
        match zone {
            HitZone::EndpointA => DragMode::Endpoint(Endpoint::A),
            HitZone::EndpointB => DragMode::Endpoint(Endpoint::B),
            HitZone::SegmentBody => DragMode::SegmentBody,
        }
    }
}

/// Where the segment was grabbed. `anchor` is the unclamped position endpoint
/// A would have if it followed the pointer rigidly.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SegmentGrab {
    offset: NormPoint,
    anchor: NormPoint,
}

/// Emitted when the line moved far enough from the last notified position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineChange {
    pub previous: Line,
    pub current: Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    StopStreaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeyOutcome {
    pub change: Option<LineChange>,
    pub command: Option<InputCommand>,
}

/// Pure significance test between two line states.
pub fn on_change(prev: &Line, curr: &Line) -> bool {
    is_significant_move(prev, curr)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineEditor {
    line: Line,
    notified: Line,
    surface: SurfaceSize,
    band: ToleranceBand,
    hit_tester: HitTester,
    drag: DragMode,
    grab: Option<SegmentGrab>,
    hover: Option<HitZone>,
    axis_lock: Option<Axis>,
    pending_point: Option<SurfacePoint>,
}

impl LineEditor {
    /// An unusable `surface` (zero, negative or non-finite) falls back to the
    /// default size.
    pub fn new(line: Line, surface: SurfaceSize, band: ToleranceBand) -> Self {
        Self {
            line,
            notified: line,
            surface: if surface.is_usable() {
                surface
            } else {
                SurfaceSize::default()
            },
            band,
            hit_tester: HitTester::with_band(band),
            drag: DragMode::None,
            grab: None,
            hover: None,
            axis_lock: None,
            pending_point: None,
        }
    }

    /// Restores the last saved line, or the default line when the store has
    /// nothing usable.
    pub fn load(store: &StateStore, surface: SurfaceSize, band: ToleranceBand) -> Self {
        let line = store.get::<Line>(LINE_KEY).unwrap_or_default();
        Self::new(line, surface, band)
    }

    pub fn save(&self, store: &mut StateStore) -> Result<()> {
        store.set(LINE_KEY, &self.line)
    }

    pub fn line(&self) -> Line {
        self.line
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    /// Unusable sizes are ignored and the previous mapping stays in place.
    pub fn set_surface(&mut self, surface: SurfaceSize) {
        if !surface.is_usable() {
            tracing::debug!(?surface, "ignoring unusable surface size");
            return;
        }
        self.surface = surface;
    }

    pub fn band(&self) -> ToleranceBand {
        self.band
    }

    pub fn set_band(&mut self, band: ToleranceBand) {
        self.band = band;
        self.hit_tester = HitTester::with_band(band);
    }

    pub fn drag_mode(&self) -> DragMode {
        self.drag
    }

    pub fn hover_zone(&self) -> Option<HitZone> {
        self.hover
    }

    pub fn axis_lock(&self) -> Option<Axis> {
        self.axis_lock
    }

    pub fn handles_visible(&self) -> bool {
        self.hover.is_some() || self.drag != DragMode::None
    }

    pub fn hover(&mut self, pointer: SurfacePoint) -> Option<HitZone> {
        self.hover = self.hit_tester.classify(pointer, &self.line, self.surface);
        self.hover
    }

    pub fn leave(&mut self) {
        self.hover = None;
    }

    pub fn begin_drag(&mut self, pointer: SurfacePoint) -> DragMode {
        self.drag = self
            .hit_tester
            .classify(pointer, &self.line, self.surface)
            .map(DragMode::from)
            .unwrap_or_default();
        self.grab = match self.drag {
            DragMode::SegmentBody => {
                let p = to_normalized(pointer, self.surface);
                let a = self.line.a();
                Some(SegmentGrab {
                    offset: NormPoint::new(p.x - a.x, p.y - a.y),
                    anchor: a,
                })
            }
            _ => None,
        };
        self.drag
    }

    pub fn update_drag(&mut self, pointer: SurfacePoint) -> Option<LineChange> {
        let p = to_normalized(pointer, self.surface);
        match self.drag {
            DragMode::None => return None,
            DragMode::Endpoint(endpoint) => self.line.set_endpoint(endpoint, p.x, p.y),
            DragMode::SegmentBody => {
                let grab = self.grab.as_mut()?;
                let anchor = NormPoint::new(p.x - grab.offset.x, p.y - grab.offset.y);
                let (dx, dy) = (anchor.x - grab.anchor.x, anchor.y - grab.anchor.y);
                grab.anchor = anchor;
                self.line.translate(dx, dy);
            }
        }
        self.commit()
    }

    pub fn end_drag(&mut self) {
        self.drag = DragMode::None;
        self.grab = None;
    }

    pub fn nudge(
        &mut self,
        target: Endpoint,
        axis: Axis,
        direction: Direction,
        magnitude: f64,
    ) -> Option<LineChange> {
        if self.axis_lock == Some(axis) {
            return None;
        }
        let step = direction.sign() * magnitude;
        let p = self.line.endpoint(target);
        match axis {
            Axis::X => self.line.set_endpoint(target, p.x + step, p.y),
            Axis::Y => self.line.set_endpoint(target, p.x, p.y + step),
        }
        self.commit()
    }

    /// Engaging a lock levels both endpoints on that axis right away.
    pub fn set_axis_lock(&mut self, lock: Option<Axis>) -> Option<LineChange> {
        self.axis_lock = lock;
        let axis = lock?;
        self.line.level(axis);
        self.commit()
    }

    pub fn handle_key(&mut self, event: KeyEvent) -> KeyOutcome {
        match map_key_event(event) {
            Some(KeyAction::Nudge {
                target,
                axis,
                direction,
                magnitude,
            }) => KeyOutcome {
                change: self.nudge(target, axis, direction, magnitude),
                command: None,
            },
            Some(KeyAction::ToggleHorizontalLock) => {
                let lock = match self.axis_lock {
                    Some(Axis::Y) => None,
                    _ => Some(Axis::Y),
                };
                tracing::debug!(?lock, "horizontal lock toggled");
                KeyOutcome {
                    change: self.set_axis_lock(lock),
                    command: None,
                }
            }
            Some(KeyAction::StopStreaming) => KeyOutcome {
                change: None,
                command: Some(InputCommand::StopStreaming),
            },
            None => KeyOutcome::default(),
        }
    }

    /// Applies all four coordinates together. Each one is clamped, and a
    /// non-finite value becomes 0.
    pub fn set_from_explicit_coordinates(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    ) -> Option<LineChange> {
        self.line = Line::new(x1, y1, x2, y2);
        self.commit()
    }

    /// The first double click marks a point, the second one defines the line.
    pub fn double_click(&mut self, pointer: SurfacePoint) -> Option<LineChange> {
        let Some(first) = self.pending_point.take() else {
            self.pending_point = Some(pointer);
            return None;
        };
        let a = clamp_point_surface(first, self.surface);
        let b = clamp_point_surface(pointer, self.surface);
        self.line = Line::new(a.x, a.y, b.x, b.y);
        self.commit()
    }

    pub fn has_pending_point(&self) -> bool {
        self.pending_point.is_some()
    }

    fn commit(&mut self) -> Option<LineChange> {
        if !on_change(&self.notified, &self.line) {
            return None;
        }
        let change = LineChange {
            previous: self.notified,
            current: self.line,
        };
        self.notified = self.line;
        Some(change)
    }
}

fn clamp_point_surface(pointer: SurfacePoint, surface: SurfaceSize) -> NormPoint {
    let p = to_normalized(pointer, surface);
    clamp_point(p.x, p.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::keys::{KeyCode, KeyModifiers};

    const SIZE: SurfaceSize = SurfaceSize::new(1000.0, 500.0);

    fn editor() -> LineEditor {
        LineEditor::new(
            Line::new(0.2, 0.5, 0.8, 0.5),
            SIZE,
            ToleranceBand::default(),
        )
    }

    fn assert_close(actual: NormPoint, x: f64, y: f64) {
        assert!((actual.x - x).abs() < 1e-9, "x: {} vs {x}", actual.x);
        assert!((actual.y - y).abs() < 1e-9, "y: {} vs {y}", actual.y);
    }

    #[test]
    fn dragging_endpoint_follows_pointer_with_clamp() {
        let mut editor = editor();
        assert_eq!(
            editor.begin_drag(SurfacePoint::new(800.0, 250.0)),
            DragMode::Endpoint(Endpoint::B)
        );
        let change = editor.update_drag(SurfacePoint::new(1200.0, 100.0));
        assert!(change.is_some());
        assert_close(editor.line().b(), 1.0, 0.2);
        assert_close(editor.line().a(), 0.2, 0.5);
    }

    #[test]
    fn dragging_body_translates_both_endpoints_by_the_pointer_delta() {
        let mut editor = editor();
        assert_eq!(
            editor.begin_drag(SurfacePoint::new(500.0, 255.0)),
            DragMode::SegmentBody
        );
        editor.update_drag(SurfacePoint::new(550.0, 305.0));
        assert_close(editor.line().a(), 0.25, 0.6);
        assert_close(editor.line().b(), 0.85, 0.6);
    }

    #[test]
    fn dragging_body_past_the_edge_compresses_the_segment() {
        let mut editor = editor();
        editor.begin_drag(SurfacePoint::new(500.0, 250.0));
        editor.update_drag(SurfacePoint::new(200.0, 250.0));
        assert_close(editor.line().a(), 0.0, 0.5);
        assert_close(editor.line().b(), 0.5, 0.5);

        // Moving back only releases what the pointer actually travels.
        editor.update_drag(SurfacePoint::new(250.0, 250.0));
        assert_close(editor.line().a(), 0.05, 0.5);
        assert_close(editor.line().b(), 0.55, 0.5);
    }

    #[test]
    fn drag_on_empty_space_does_nothing() {
        let mut editor = editor();
        assert_eq!(editor.begin_drag(SurfacePoint::new(10.0, 10.0)), DragMode::None);
        assert_eq!(editor.update_drag(SurfacePoint::new(600.0, 400.0)), None);
        assert_eq!(editor.line(), Line::new(0.2, 0.5, 0.8, 0.5));
    }

    #[test]
    fn end_drag_resets_mode() {
        let mut editor = editor();
        editor.begin_drag(SurfacePoint::new(200.0, 250.0));
        assert!(editor.handles_visible());
        editor.end_drag();
        assert_eq!(editor.drag_mode(), DragMode::None);
        assert!(!editor.handles_visible());
    }

    #[test]
    fn jitter_is_suppressed_but_accumulated_moves_notify() {
        let mut editor = editor();
        editor.begin_drag(SurfacePoint::new(800.0, 250.0));
        // 1px on a 1000px surface is 0.001.
        assert_eq!(editor.update_drag(SurfacePoint::new(801.0, 250.0)), None);
        assert_eq!(editor.update_drag(SurfacePoint::new(802.0, 250.0)), None);
        assert_eq!(editor.update_drag(SurfacePoint::new(803.0, 250.0)), None);
        assert_eq!(editor.update_drag(SurfacePoint::new(804.0, 250.0)), None);
        let change = editor
            .update_drag(SurfacePoint::new(806.0, 250.0))
            .expect("accumulated move is significant");
        assert_eq!(change.previous, Line::new(0.2, 0.5, 0.8, 0.5));
        assert_eq!(change.current, editor.line());
    }

    #[test]
    fn nudge_moves_one_coordinate_and_clamps() {
        let mut editor = editor();
        let change = editor.nudge(Endpoint::A, Axis::X, Direction::Negative, 0.3);
        assert!(change.is_some());
        assert_close(editor.line().a(), 0.0, 0.5);
    }

    #[test]
    fn horizontal_lock_levels_and_blocks_vertical_nudges() {
        let mut editor = LineEditor::new(
            Line::new(0.1, 0.2, 0.9, 0.6),
            SIZE,
            ToleranceBand::default(),
        );
        let outcome = editor.handle_key(KeyEvent::plain(KeyCode::H));
        assert!(outcome.change.is_some());
        assert_eq!(editor.axis_lock(), Some(Axis::Y));
        assert_close(editor.line().a(), 0.1, 0.4);
        assert_close(editor.line().b(), 0.9, 0.4);

        let outcome = editor.handle_key(KeyEvent::plain(KeyCode::ArrowDown));
        assert_eq!(outcome.change, None);
        assert_close(editor.line().b(), 0.9, 0.4);

        let outcome = editor.handle_key(KeyEvent {
            key: KeyCode::ArrowRight,
            modifiers: KeyModifiers {
                alt: false,
                shift: true,
            },
        });
        assert!(outcome.change.is_some());
        assert_close(editor.line().b(), 0.92, 0.4);

        editor.handle_key(KeyEvent::plain(KeyCode::H));
        assert_eq!(editor.axis_lock(), None);
    }

    #[test]
    fn escape_requests_stop() {
        let mut editor = editor();
        let outcome = editor.handle_key(KeyEvent::plain(KeyCode::Escape));
        assert_eq!(outcome.command, Some(InputCommand::StopStreaming));
        assert_eq!(outcome.change, None);
    }

    #[test]
    fn explicit_coordinates_apply_atomically() {
        let mut editor = editor();
        let change = editor.set_from_explicit_coordinates(0.1, f64::NAN, 0.3, 0.4);
        assert!(change.is_some());
        assert_eq!(editor.line().coords(), [0.1, 0.0, 0.3, 0.4]);

        let change = editor.set_from_explicit_coordinates(f64::INFINITY, 0.2, 0.5, 0.6);
        assert!(change.is_some());
        assert_eq!(editor.line().coords(), [0.0, 0.2, 0.5, 0.6]);

        let change = editor.set_from_explicit_coordinates(-0.5, 0.1, 0.3, 1.4);
        assert!(change.is_some());
        assert_eq!(editor.line().coords(), [0.0, 0.1, 0.3, 1.0]);
    }

    #[test]
    fn zero_sized_surface_is_ignored() {
        let mut editor =
            LineEditor::new(Line::new(0.2, 0.2, 0.8, 0.8), SIZE, ToleranceBand::default());
        editor.set_surface(SurfaceSize::new(0.0, 500.0));
        editor.set_surface(SurfaceSize::new(f64::NAN, 500.0));
        editor.set_surface(SurfaceSize::new(800.0, -1.0));
        assert_eq!(editor.surface(), SIZE);

        // Body midpoint at (500, 250) on the kept 1000x500 surface.
        assert_eq!(
            editor.begin_drag(SurfacePoint::new(500.0, 250.0)),
            DragMode::SegmentBody
        );
        editor.update_drag(SurfacePoint::new(500.0, 260.0));
        assert_close(editor.line().a(), 0.2, 0.22);
        assert_close(editor.line().b(), 0.8, 0.82);
    }

    #[test]
    fn unusable_initial_surface_falls_back_to_default() {
        let editor = LineEditor::new(
            Line::default(),
            SurfaceSize::new(0.0, 0.0),
            ToleranceBand::default(),
        );
        assert_eq!(editor.surface(), SurfaceSize::default());
    }

    #[test]
    fn two_double_clicks_define_a_new_line() {
        let mut editor = editor();
        assert_eq!(editor.double_click(SurfacePoint::new(100.0, 100.0)), None);
        assert!(editor.has_pending_point());
        let change = editor.double_click(SurfacePoint::new(900.0, 600.0));
        assert!(change.is_some());
        assert!(!editor.has_pending_point());
        assert_close(editor.line().a(), 0.1, 0.2);
        assert_close(editor.line().b(), 0.9, 1.0);
    }

    #[test]
    fn hover_tracks_zone_until_leave() {
        let mut editor = editor();
        assert_eq!(
            editor.hover(SurfacePoint::new(500.0, 252.0)),
            Some(HitZone::SegmentBody)
        );
        assert!(editor.handles_visible());
        editor.leave();
        assert_eq!(editor.hover_zone(), None);
    }

    #[test]
    fn resize_keeps_the_normalized_line() {
        let mut editor = editor();
        let before = editor.line();
        editor.set_surface(SurfaceSize::new(640.0, 360.0));
        assert_eq!(editor.line(), before);
        assert_eq!(
            editor.hover(SurfacePoint::new(128.0, 180.0)),
            Some(HitZone::EndpointA)
        );
    }
}
