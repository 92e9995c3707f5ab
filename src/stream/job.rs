use crate::editor::hit_test::DEFAULT_TOLERANCE_PX;
use crate::editor::model::Line;
use crate::editor::store::{StateStore, PARAMS_KEY};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Numeric knobs remembered between runs under the `params` store key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessingParams {
    #[serde(default = "default_sample_fps")]
    pub sample_fps: f64,
    #[serde(default = "default_chunk_seconds")]
    pub chunk_seconds: u32,
    /// 0 lets the backend pick.
    #[serde(default)]
    pub workers: u32,
    #[serde(default = "default_tolerance_px")]
    pub tolerance_px: f64,
    #[serde(default)]
    pub save_annotated: bool,
}

fn default_sample_fps() -> f64 {
    5.0
}

fn default_chunk_seconds() -> u32 {
    60
}

fn default_tolerance_px() -> f64 {
    DEFAULT_TOLERANCE_PX
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            sample_fps: default_sample_fps(),
            chunk_seconds: default_chunk_seconds(),
            workers: 0,
            tolerance_px: default_tolerance_px(),
            save_annotated: false,
        }
    }
}

impl ProcessingParams {
    /// Last used parameters, or the defaults when nothing usable is stored.
    pub fn load(store: &StateStore) -> Self {
        store.get(PARAMS_KEY).unwrap_or_default()
    }

    pub fn save(&self, store: &mut StateStore) -> Result<()> {
        store.set(PARAMS_KEY, self)
    }

    /// True when a streaming run started with `self` would differ from one
    /// started with `other`. Only the knobs sent on the stream route count;
    /// `tolerance_px` is editor-side and `save_annotated` is batch only.
    pub fn changes_stream(&self, other: &Self) -> bool {
        self.sample_fps != other.sample_fps
            || self.chunk_seconds != other.chunk_seconds
            || self.workers != other.workers
    }
}

/// Everything the backend needs to run one counting job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub video_path: String,
    pub line: Line,
    pub params: ProcessingParams,
}

#[derive(Debug, Serialize)]
pub struct BatchBody<'a> {
    video_path: &'a str,
    line: [f64; 4],
    sample_fps: f64,
    chunk_seconds: u32,
    workers: u32,
    save_annotated: bool,
}

impl JobRequest {
    pub fn new(video_path: impl Into<String>, line: Line, params: ProcessingParams) -> Self {
        Self {
            video_path: video_path.into(),
            line,
            params,
        }
    }

    pub fn has_target(&self) -> bool {
        !self.video_path.trim().is_empty()
    }

    /// Query parameters of the streaming endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let [x1, y1, x2, y2] = self.line.coords();
        vec![
            ("video_path", self.video_path.clone()),
            ("x1", x1.to_string()),
            ("y1", y1.to_string()),
            ("x2", x2.to_string()),
            ("y2", y2.to_string()),
            ("sample_fps", self.params.sample_fps.to_string()),
            ("chunk_seconds", self.params.chunk_seconds.to_string()),
            ("workers", self.params.workers.to_string()),
        ]
    }

    /// JSON body of the one-shot processing endpoint.
    pub fn batch_body(&self) -> BatchBody<'_> {
        BatchBody {
            video_path: &self.video_path,
            line: self.line.coords(),
            sample_fps: self.params.sample_fps,
            chunk_seconds: self.params.chunk_seconds,
            workers: self.params.workers,
            save_annotated: self.params.save_annotated,
        }
    }
}
