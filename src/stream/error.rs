use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Streaming was requested before any video was selected.
    #[error("no video selected for processing")]
    MissingJobTarget,
}
