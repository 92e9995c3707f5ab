pub mod input;
pub mod keys;
pub mod model;
pub mod store;

pub use hit_test::{HitTester, HitZone, ToleranceBand};
pub use input::{on_change, DragMode, InputCommand, KeyOutcome, LineChange, LineEditor};
pub use model::{Axis, Endpoint, Line, NormPoint, SurfacePoint, SurfaceSize};
pub use store::StateStore;
