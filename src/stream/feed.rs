use crate::stream::job::JobRequest;
use anyhow::Result;
use async_trait::async_trait;

/// Ordered, lazily produced sequence of raw event payloads from one backend
/// run.
///
/// `None` means the transport ended. `next_payload` must be cancel safe:
/// dropping its future before completion loses no payload. Dropping the feed
/// closes the transport, after which nothing more is produced.
#[async_trait]
pub trait EventFeed: Send {
    async fn next_payload(&mut self) -> Option<Result<String>>;
}

/// Opens a fresh feed for a job.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn open(&self, request: &JobRequest) -> Result<Box<dyn EventFeed>>;
}
