use crate::stream::event::{net_count, parse_event, FeedEvent, FinalTotals, ProgressReport};
use crate::stream::feed::{EventFeed, FeedSource};
use crate::stream::job::JobRequest;
use crate::stream::policy::{Backoff, ReconnectPolicy};
use crate::stream::timer::SlotTimer;
use crate::stream::StreamError;
use std::time::Duration;
use tokio::time::Instant;

/// Floor on the interval between progress events used for rate math.
const MIN_RATE_INTERVAL_SECS: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Completed,
    RetriesExhausted,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Connecting,
    Active,
    /// Transient failure, waiting out the backoff before reconnecting.
    Failed,
    Closed(CloseReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    pub in_count: u64,
    pub out_count: u64,
}

impl Counters {
    pub fn net(&self) -> i64 {
        net_count(self.in_count, self.out_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressSnapshot {
    pub pct: f64,
    pub in_count: u64,
    pub out_count: u64,
    pub delta_in: u64,
    pub delta_out: u64,
    pub rpm_in: f64,
    pub rpm_out: f64,
}

impl ProgressSnapshot {
    pub fn net(&self) -> i64 {
        net_count(self.in_count, self.out_count)
    }

    pub fn status_line(&self) -> String {
        format!(
            "Processing… {}% | IN {} • OUT {} | +/min {:.1}/{:.1}",
            self.pct, self.in_count, self.out_count, self.rpm_in, self.rpm_out
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Progress(ProgressSnapshot),
    Finished(FinalTotals),
    /// `attempt` counts reconnects since the last `start`, starting at 1.
    Retrying {
        attempt: u32,
        delay: Duration,
        reason: String,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Default)]
struct RateWindow {
    last_progress_at: Option<Instant>,
}

/// One backend counting run at a time: owns the feed, the counters and the
/// reconnect loop.
pub struct StreamSession<S> {
    source: S,
    policy: ReconnectPolicy,
    status: SessionStatus,
    request: Option<JobRequest>,
    feed: Option<Box<dyn EventFeed>>,
    attempt: u32,
    counters: Counters,
    rate: RateWindow,
    last_event_at: Option<Instant>,
    backoff: SlotTimer,
    run: u64,
}

impl<S: FeedSource> StreamSession<S> {
    pub fn new(source: S, policy: ReconnectPolicy) -> Self {
        Self {
            source,
            policy,
            status: SessionStatus::Idle,
            request: None,
            feed: None,
            attempt: 0,
            counters: Counters::default(),
            rate: RateWindow::default(),
            last_event_at: None,
            backoff: SlotTimer::default(),
            run: 0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn request(&self) -> Option<&JobRequest> {
        self.request.as_ref()
    }

    pub fn last_event_at(&self) -> Option<Instant> {
        self.last_event_at
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_live(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Connecting | SessionStatus::Active | SessionStatus::Failed
        )
    }

    /// Begins a fresh run, tearing down any run in flight. The feed itself is
    /// opened by the next call to [`Self::next_update`].
    pub fn start(&mut self, request: JobRequest) -> Result<(), StreamError> {
        if !request.has_target() {
            return Err(StreamError::MissingJobTarget);
        }
        self.teardown();
        self.run += 1;
        self.request = Some(request);
        self.counters = Counters::default();
        self.rate = RateWindow::default();
        self.last_event_at = None;
        self.attempt = 0;
        self.status = SessionStatus::Connecting;
        tracing::info!(run = self.run, "stream session started");
        Ok(())
    }

    /// Safe in any state. Nothing from the torn-down feed is delivered
    /// afterwards.
    pub fn stop(&mut self) {
        self.teardown();
        if !matches!(self.status, SessionStatus::Closed(_)) {
            tracing::info!(run = self.run, status = ?self.status, "stream session stopped");
            self.status = SessionStatus::Closed(CloseReason::Stopped);
        }
    }

    pub fn reset_counters(&mut self) {
        self.counters = Counters::default();
        self.rate = RateWindow::default();
    }

    /// Drives the run until something worth reporting happens. Pends forever
    /// while idle or closed. Cancel safe.
    pub async fn next_update(&mut self) -> SessionUpdate {
        loop {
            match self.status {
                SessionStatus::Idle | SessionStatus::Closed(_) => {
                    std::future::pending::<()>().await;
                }
                SessionStatus::Failed => {
                    self.backoff.fired().await;
                    self.status = SessionStatus::Connecting;
                }
                SessionStatus::Connecting | SessionStatus::Active => {
                    if let Some(update) = self.pump().await {
                        return update;
                    }
                }
            }
        }
    }

    async fn pump(&mut self) -> Option<SessionUpdate> {
        if self.feed.is_none() {
            let Some(request) = self.request.clone() else {
                self.status = SessionStatus::Idle;
                return None;
            };
            match self.source.open(&request).await {
                Ok(feed) => {
                    tracing::debug!(run = self.run, attempt = self.attempt, "event feed open");
                    self.feed = Some(feed);
                }
                Err(err) => return Some(self.fail(format!("{err:#}"))),
            }
        }

        let frame = match self.feed.as_mut() {
            Some(feed) => feed.next_payload().await,
            None => return None,
        };
        match frame {
            None => Some(self.fail("event stream ended before completion".to_string())),
            Some(Err(err)) => Some(self.fail(format!("{err:#}"))),
            Some(Ok(payload)) => match parse_event(&payload) {
                Ok(event) => Some(self.apply(event)),
                Err(err) => Some(self.fail(format!("malformed event: {err}"))),
            },
        }
    }

    fn apply(&mut self, event: FeedEvent) -> SessionUpdate {
        self.last_event_at = Some(Instant::now());
        match event {
            FeedEvent::Progress(report) => {
                if self.status == SessionStatus::Connecting {
                    tracing::info!(run = self.run, "stream session active");
                }
                self.status = SessionStatus::Active;
                SessionUpdate::Progress(self.record_progress(&report))
            }
            FeedEvent::Done(report) => {
                let totals = report.resolve(self.counters.in_count, self.counters.out_count);
                self.counters = Counters {
                    in_count: totals.in_total,
                    out_count: totals.out_total,
                };
                self.teardown();
                self.status = SessionStatus::Closed(CloseReason::Completed);
                tracing::info!(
                    run = self.run,
                    in_total = totals.in_total,
                    out_total = totals.out_total,
                    "stream session completed"
                );
                SessionUpdate::Finished(totals)
            }
            FeedEvent::Error { message } => {
                self.fail(message.unwrap_or_else(|| "backend reported an error".to_string()))
            }
        }
    }

    /// Partial counts only ratchet upward; the first progress event of a
    /// connection sets the rate baseline and reports no delta.
    fn record_progress(&mut self, report: &ProgressReport) -> ProgressSnapshot {
        let now = Instant::now();
        let next = Counters {
            in_count: self
                .counters
                .in_count
                .max(report.in_partial.unwrap_or(self.counters.in_count)),
            out_count: self
                .counters
                .out_count
                .max(report.out_partial.unwrap_or(self.counters.out_count)),
        };

        let mut snapshot = ProgressSnapshot {
            pct: report.pct,
            in_count: next.in_count,
            out_count: next.out_count,
            ..ProgressSnapshot::default()
        };
        if let Some(last) = self.rate.last_progress_at {
            snapshot.delta_in = next.in_count - self.counters.in_count;
            snapshot.delta_out = next.out_count - self.counters.out_count;
            let secs = now
                .duration_since(last)
                .as_secs_f64()
                .max(MIN_RATE_INTERVAL_SECS);
            snapshot.rpm_in = snapshot.delta_in as f64 / secs * 60.0;
            snapshot.rpm_out = snapshot.delta_out as f64 / secs * 60.0;
        }

        self.counters = next;
        self.rate.last_progress_at = Some(now);
        snapshot
    }

    fn fail(&mut self, reason: String) -> SessionUpdate {
        self.feed = None;
        self.rate = RateWindow::default();
        match self.policy.next_delay(self.attempt) {
            Backoff::Delay(delay) => {
                self.attempt += 1;
                self.backoff.arm(delay);
                self.status = SessionStatus::Failed;
                tracing::warn!(
                    run = self.run,
                    attempt = self.attempt,
                    ?delay,
                    %reason,
                    "event stream failed, reconnecting"
                );
                SessionUpdate::Retrying {
                    attempt: self.attempt,
                    delay,
                    reason,
                }
            }
            Backoff::GiveUp => {
                self.backoff.cancel();
                self.status = SessionStatus::Closed(CloseReason::RetriesExhausted);
                tracing::error!(run = self.run, %reason, "event stream gave up");
                SessionUpdate::Failed { reason }
            }
        }
    }

    fn teardown(&mut self) {
        self.feed = None;
        self.backoff.cancel();
    }
}
