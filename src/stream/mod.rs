pub mod backend;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod feed;
pub mod job;
pub mod policy;
pub mod session;
pub mod sse;
#[cfg(test)]
pub(crate) mod testing;
pub mod timer;

pub use backend::HttpBackend;
pub use coordinator::{CoordinatorEvent, SessionCoordinator};
pub use error::StreamError;
pub use event::{ArtifactKind, ArtifactRef, CountWindow, FeedEvent, FinalTotals};
pub use feed::{EventFeed, FeedSource};
pub use job::{JobRequest, ProcessingParams};
pub use policy::{Backoff, ReconnectPolicy};
pub use session::{
    CloseReason, Counters, ProgressSnapshot, SessionStatus, SessionUpdate, StreamSession,
};
pub use timer::{SlotTimer, Throttle};
