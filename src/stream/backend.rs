use crate::stream::event::{DoneReport, FinalTotals};
use crate::stream::feed::{EventFeed, FeedSource};
use crate::stream::job::JobRequest;
use crate::stream::sse::SseDecoder;
use crate::stream::StreamError;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const STREAM_ROUTE: &str = "process/stream";
const BATCH_ROUTE: &str = "process";

/// HTTP client for the counting backend: the SSE progress feed and the
/// one-shot batch endpoint.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    batch_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct BatchReply {
    #[serde(default = "default_ok")]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    report: DoneReport,
}

fn default_ok() -> bool {
    true
}

impl HttpBackend {
    pub fn new(base_url: &str, connect_timeout: Duration, batch_timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("parse backend url {base_url}"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent("crossline")
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url,
            batch_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn stream_url(&self, request: &JobRequest) -> Result<Url> {
        let mut url = self
            .base_url
            .join(STREAM_ROUTE)
            .context("build stream url")?;
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        Ok(url)
    }

    /// Runs the whole job in one request and returns its totals.
    pub async fn process_batch(&self, request: &JobRequest) -> Result<FinalTotals> {
        if !request.has_target() {
            return Err(StreamError::MissingJobTarget.into());
        }
        let url = self.base_url.join(BATCH_ROUTE).context("build batch url")?;
        let resp = self
            .client
            .post(url)
            .timeout(self.batch_timeout)
            .json(&request.batch_body())
            .send()
            .await
            .context("send batch request")?;
        let status = resp.status();
        let reply: BatchReply = match resp.json().await {
            Ok(reply) => reply,
            Err(err) if status.is_success() => {
                return Err(anyhow!(err).context("decode batch reply"));
            }
            Err(_) => bail!("http status {status}"),
        };
        if !reply.ok || !status.is_success() {
            bail!(reply
                .error
                .unwrap_or_else(|| format!("http status {status}")));
        }
        Ok(reply.report.resolve(0, 0))
    }
}

#[async_trait]
impl FeedSource for HttpBackend {
    async fn open(&self, request: &JobRequest) -> Result<Box<dyn EventFeed>> {
        let url = self.stream_url(request)?;
        tracing::debug!(%url, "opening event stream");
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .context("connect event stream")?
            .error_for_status()
            .context("event stream rejected")?;
        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(Box::new(HttpEventFeed {
            body,
            decoder: SseDecoder::default(),
        }))
    }
}

struct HttpEventFeed {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
}

#[async_trait]
impl EventFeed for HttpEventFeed {
    async fn next_payload(&mut self) -> Option<Result<String>> {
        loop {
            if let Some(payload) = self.decoder.next_payload() {
                return Some(Ok(payload));
            }
            match self.body.next().await {
                Some(Ok(chunk)) => self.decoder.push(&chunk),
                Some(Err(err)) => return Some(Err(anyhow!(err).context("read event stream"))),
                None => return None,
            }
        }
    }
}
