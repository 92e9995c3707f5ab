use crate::editor::input::LineChange;
use crate::editor::model::Line;
use crate::stream::feed::FeedSource;
use crate::stream::job::{JobRequest, ProcessingParams};
use crate::stream::session::{SessionUpdate, StreamSession};
use crate::stream::timer::SlotTimer;
use crate::stream::StreamError;
use std::time::Duration;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(450);

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// A settled edit replaced the running job.
    Restarted(JobRequest),
    Session(SessionUpdate),
}

/// Turns editor and parameter changes into session restarts while
/// auto-streaming is engaged. Bursts of changes collapse into one restart
/// carrying the latest state.
pub struct SessionCoordinator<S> {
    session: StreamSession<S>,
    debounce: SlotTimer,
    debounce_delay: Duration,
    auto_streaming: bool,
    video_path: Option<String>,
    line: Line,
    params: ProcessingParams,
    restarts: u64,
}

impl<S: FeedSource> SessionCoordinator<S> {
    pub fn new(session: StreamSession<S>, line: Line, params: ProcessingParams) -> Self {
        Self {
            session,
            debounce: SlotTimer::default(),
            debounce_delay: DEFAULT_DEBOUNCE,
            auto_streaming: false,
            video_path: None,
            line,
            params,
            restarts: 0,
        }
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn session(&self) -> &StreamSession<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut StreamSession<S> {
        &mut self.session
    }

    pub fn is_auto_streaming(&self) -> bool {
        self.auto_streaming
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn line(&self) -> Line {
        self.line
    }

    pub fn params(&self) -> ProcessingParams {
        self.params
    }

    pub fn set_target(&mut self, video_path: impl Into<String>) {
        let path = video_path.into();
        self.video_path = (!path.trim().is_empty()).then_some(path);
    }

    pub fn request(&self) -> JobRequest {
        JobRequest::new(
            self.video_path.clone().unwrap_or_default(),
            self.line,
            self.params,
        )
    }

    /// Starts a session right away and keeps restarting it on settled edits.
    pub fn engage_auto_streaming(&mut self) -> Result<(), StreamError> {
        self.debounce.cancel();
        self.session.start(self.request())?;
        self.auto_streaming = true;
        tracing::info!("auto-streaming engaged");
        Ok(())
    }

    /// One-off run that does not follow later edits.
    pub fn start_manual(&mut self) -> Result<(), StreamError> {
        self.debounce.cancel();
        self.auto_streaming = false;
        self.session.start(self.request())
    }

    pub fn disengage(&mut self) {
        if self.auto_streaming {
            tracing::info!("auto-streaming disengaged");
        }
        self.auto_streaming = false;
        self.debounce.cancel();
    }

    /// Stops the running session and leaves auto mode.
    pub fn stop(&mut self) {
        self.disengage();
        self.session.stop();
    }

    pub fn line_changed(&mut self, change: LineChange) {
        self.line = change.current;
        self.schedule_restart();
    }

    /// Records the new parameters. Only changes the stream route carries
    /// schedule a restart.
    pub fn params_changed(&mut self, params: ProcessingParams) {
        let restart = params.changes_stream(&self.params);
        self.params = params;
        if restart {
            self.schedule_restart();
        }
    }

    fn schedule_restart(&mut self) {
        if self.auto_streaming {
            self.debounce.arm(self.debounce_delay);
        }
    }

    fn restart(&mut self) -> Option<JobRequest> {
        if !self.auto_streaming {
            return None;
        }
        let request = self.request();
        self.session.stop();
        match self.session.start(request.clone()) {
            Ok(()) => {
                self.restarts += 1;
                tracing::debug!(restarts = self.restarts, "session restarted after edit");
                Some(request)
            }
            Err(err) => {
                tracing::warn!(%err, "restart skipped");
                self.disengage();
                None
            }
        }
    }

    /// Next thing the presentation layer should hear about. Cancel safe.
    pub async fn next_event(&mut self) -> CoordinatorEvent {
        loop {
            tokio::select! {
                biased;
                _ = self.debounce.fired() => {
                    if let Some(request) = self.restart() {
                        return CoordinatorEvent::Restarted(request);
                    }
                }
                update = self.session.next_update() => {
                    if matches!(update, SessionUpdate::Finished(_) | SessionUpdate::Failed { .. }) {
                        self.disengage();
                    }
                    return CoordinatorEvent::Session(update);
                }
            }
        }
    }
}
