use crate::stream::feed::{EventFeed, FeedSource};
use crate::stream::job::JobRequest;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

struct Script {
    payloads: Vec<String>,
    close: bool,
}

#[derive(Default)]
struct ScriptState {
    opened: Vec<JobRequest>,
    scripts: VecDeque<Script>,
    failing_opens: u32,
    live: Option<mpsc::UnboundedSender<Result<String>>>,
}

/// In-memory feed source. Each `open` consumes the next queued script; the
/// feed then stays open so tests can push more payloads with `send`.
#[derive(Clone, Default)]
pub(crate) struct ScriptedSource {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedSource {
    fn with_state<R>(&self, f: impl FnOnce(&mut ScriptState) -> R) -> R {
        let mut state = self.state.lock().expect("script state lock");
        f(&mut state)
    }

    pub(crate) fn script(&self, payloads: &[&str]) {
        self.push_script(payloads, false);
    }

    pub(crate) fn script_then_close(&self, payloads: &[&str]) {
        self.push_script(payloads, true);
    }

    fn push_script(&self, payloads: &[&str], close: bool) {
        let payloads = payloads.iter().map(|p| p.to_string()).collect();
        self.with_state(|s| s.scripts.push_back(Script { payloads, close }));
    }

    pub(crate) fn fail_next_opens(&self, count: u32) {
        self.with_state(|s| s.failing_opens = count);
    }

    pub(crate) fn send(&self, payload: &str) {
        self.with_state(|s| {
            if let Some(tx) = &s.live {
                let _ = tx.send(Ok(payload.to_string()));
            }
        });
    }

    pub(crate) fn opened(&self) -> Vec<JobRequest> {
        self.with_state(|s| s.opened.clone())
    }

    pub(crate) fn open_count(&self) -> usize {
        self.with_state(|s| s.opened.len())
    }
}

struct ScriptedFeed {
    rx: mpsc::UnboundedReceiver<Result<String>>,
}

#[async_trait]
impl EventFeed for ScriptedFeed {
    async fn next_payload(&mut self) -> Option<Result<String>> {
        self.rx.recv().await
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    async fn open(&self, request: &JobRequest) -> Result<Box<dyn EventFeed>> {
        let rx = self.with_state(|s| {
            s.opened.push(request.clone());
            if s.failing_opens > 0 {
                s.failing_opens -= 1;
                return None;
            }
            let (tx, rx) = mpsc::unbounded_channel();
            let script = s.scripts.pop_front().unwrap_or(Script {
                payloads: Vec::new(),
                close: false,
            });
            for payload in script.payloads {
                let _ = tx.send(Ok(payload));
            }
            s.live = if script.close { None } else { Some(tx) };
            Some(rx)
        });
        match rx {
            Some(rx) => Ok(Box::new(ScriptedFeed { rx })),
            None => bail!("connection refused"),
        }
    }
}
