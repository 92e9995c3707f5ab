use std::time::Duration;
use tokio::time::Instant;

/// Single pending deadline. Arming replaces whatever was pending, so at most
/// one timer of a given purpose exists at a time.
#[derive(Debug, Default)]
pub struct SlotTimer {
    deadline: Option<Instant>,
}

impl SlotTimer {
    pub fn arm(&mut self, delay: Duration) {
        self.deadline = Some(Instant::now() + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves when the armed deadline passes and disarms the slot. Pends
    /// forever while nothing is armed. Dropping the future leaves the deadline
    /// in place, so it is safe to use inside `tokio::select!`.
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// Leading-edge rate limiter for status output.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
