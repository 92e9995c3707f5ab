use serde::{Deserialize, Serialize};

/// Sum of absolute per-coordinate deltas below which a move counts as jitter.
pub const SIGNIFICANT_MOVE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormPoint {
    pub x: f64,
    pub y: f64,
}

impl NormPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfacePoint {
    pub x: f64,
    pub y: f64,
}

impl SurfacePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: SurfacePoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both sides finite and positive, so the normalized mapping is defined.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Clamps each coordinate independently to `[0, 1]`. Non-finite input maps to 0.
pub fn clamp_point(x: f64, y: f64) -> NormPoint {
    NormPoint::new(clamp_unit(x), clamp_unit(y))
}

pub fn to_surface(point: NormPoint, size: SurfaceSize) -> SurfacePoint {
    SurfacePoint::new(point.x * size.width, point.y * size.height)
}

/// Inverse of [`to_surface`]. The result is not clamped, so points outside the
/// surface map outside the unit square.
pub fn to_normalized(point: SurfacePoint, size: SurfaceSize) -> NormPoint {
    NormPoint::new(point.x / size.width, point.y / size.height)
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawLine {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl From<RawLine> for Line {
    fn from(raw: RawLine) -> Self {
        Line::new(raw.x1, raw.y1, raw.x2, raw.y2)
    }
}

/// Directed counting segment in normalized surface coordinates.
///
/// Every constructor and setter clamps, so a `Line` never holds a coordinate
/// outside `[0, 1]`. Deserialization goes through the same clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLine")]
pub struct Line {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl Default for Line {
    fn default() -> Self {
        Self::new(0.2, 0.8, 0.8, 0.8)
    }
}

impl Line {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let a = clamp_point(x1, y1);
        let b = clamp_point(x2, y2);
        Self::from_points(a, b)
    }

    fn from_points(a: NormPoint, b: NormPoint) -> Self {
        Self {
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
        }
    }

    pub fn a(&self) -> NormPoint {
        NormPoint::new(self.x1, self.y1)
    }

    pub fn b(&self) -> NormPoint {
        NormPoint::new(self.x2, self.y2)
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> NormPoint {
        match endpoint {
            Endpoint::A => self.a(),
            Endpoint::B => self.b(),
        }
    }

    pub fn coords(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    pub(crate) fn set_endpoint(&mut self, endpoint: Endpoint, x: f64, y: f64) {
        let p = clamp_point(x, y);
        match endpoint {
            Endpoint::A => {
                self.x1 = p.x;
                self.y1 = p.y;
            }
            Endpoint::B => {
                self.x2 = p.x;
                self.y2 = p.y;
            }
        }
    }

    /// Moves both endpoints by the same delta, clamping each one on its own.
    /// Near an edge the segment compresses instead of refusing the move.
    pub(crate) fn translate(&mut self, dx: f64, dy: f64) {
        let a = clamp_point(self.x1 + dx, self.y1 + dy);
        let b = clamp_point(self.x2 + dx, self.y2 + dy);
        *self = Self::from_points(a, b);
    }

    pub(crate) fn level(&mut self, axis: Axis) {
        match axis {
            Axis::X => {
                let mid = (self.x1 + self.x2) / 2.0;
                self.x1 = mid;
                self.x2 = mid;
            }
            Axis::Y => {
                let mid = (self.y1 + self.y2) / 2.0;
                self.y1 = mid;
                self.y2 = mid;
            }
        }
    }

    pub fn surface_endpoints(&self, size: SurfaceSize) -> (SurfacePoint, SurfacePoint) {
        (to_surface(self.a(), size), to_surface(self.b(), size))
    }

    /// Sum of absolute coordinate deltas across both endpoints.
    pub fn manhattan_delta(&self, other: &Line) -> f64 {
        (self.x1 - other.x1).abs()
            + (self.x2 - other.x2).abs()
            + (self.y1 - other.y1).abs()
            + (self.y2 - other.y2).abs()
    }
}

/// True when the move from `prev` to `curr` is large enough to warrant
/// reprocessing.
pub fn is_significant_move(prev: &Line, curr: &Line) -> bool {
    prev.manhattan_delta(curr) >= SIGNIFICANT_MOVE
}
