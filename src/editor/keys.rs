use crate::editor::model::{Axis, Endpoint};

pub const NUDGE_STEP: f64 = 0.01;
pub const NUDGE_STEP_FAST: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    H,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    pub alt: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub fn plain(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Negative,
    Positive,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Negative => -1.0,
            Direction::Positive => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Nudge {
        target: Endpoint,
        axis: Axis,
        direction: Direction,
        magnitude: f64,
    },
    ToggleHorizontalLock,
    StopStreaming,
}

/// Arrows move endpoint B, or A with Alt held. Shift doubles the step.
pub fn map_key_event(event: KeyEvent) -> Option<KeyAction> {
    let target = if event.modifiers.alt {
        Endpoint::A
    } else {
        Endpoint::B
    };
    let magnitude = if event.modifiers.shift {
        NUDGE_STEP_FAST
    } else {
        NUDGE_STEP
    };
    let nudge = |axis, direction| KeyAction::Nudge {
        target,
        axis,
        direction,
        magnitude,
    };

    match event.key {
        KeyCode::ArrowLeft => Some(nudge(Axis::X, Direction::Negative)),
        KeyCode::ArrowRight => Some(nudge(Axis::X, Direction::Positive)),
        KeyCode::ArrowUp => Some(nudge(Axis::Y, Direction::Negative)),
        KeyCode::ArrowDown => Some(nudge(Axis::Y, Direction::Positive)),
        KeyCode::H => Some(KeyAction::ToggleHorizontalLock),
        KeyCode::Escape => Some(KeyAction::StopStreaming),
        KeyCode::Other => None,
    }
}
