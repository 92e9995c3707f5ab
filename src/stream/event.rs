use serde::{Deserialize, Serialize};

const OUTPUTS_MARKER: &str = "outputs/";

/// One decoded feed payload, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    Progress(ProgressReport),
    Done(DoneReport),
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressReport {
    #[serde(default)]
    pub pct: f64,
    #[serde(default)]
    pub in_partial: Option<u64>,
    #[serde(default)]
    pub out_partial: Option<u64>,
}

/// Terminal payload of a streaming run, also the body of a batch reply.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DoneReport {
    #[serde(default)]
    pub in_total: Option<u64>,
    #[serde(default)]
    pub out_total: Option<u64>,
    #[serde(default)]
    pub net_total: Option<i64>,
    #[serde(default)]
    pub windows: Vec<CountWindow>,
    #[serde(default)]
    pub csv_path: Option<String>,
    #[serde(default)]
    pub annotated_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountWindow {
    pub start: String,
    pub end: String,
    #[serde(rename = "in")]
    pub in_count: u64,
    #[serde(rename = "out")]
    pub out_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Csv,
    AnnotatedVideo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub path: String,
}

impl ArtifactRef {
    /// Download route for the artifact, relative to the backend root.
    pub fn download_path(&self) -> String {
        let relative = match self.path.rfind(OUTPUTS_MARKER) {
            Some(idx) => &self.path[idx + OUTPUTS_MARKER.len()..],
            None => self.path.as_str(),
        };
        format!("/download/{}", urlencoding::encode(relative))
    }
}

/// Authoritative totals surfaced once a run completes.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalTotals {
    pub in_total: u64,
    pub out_total: u64,
    pub net_total: i64,
    pub windows: Vec<CountWindow>,
    pub artifacts: Vec<ArtifactRef>,
}

impl DoneReport {
    /// Totals the report carries, falling back to `current` for anything it
    /// leaves out.
    pub fn resolve(&self, current_in: u64, current_out: u64) -> FinalTotals {
        let in_total = self.in_total.unwrap_or(current_in);
        let out_total = self.out_total.unwrap_or(current_out);
        let net_total = self
            .net_total
            .unwrap_or_else(|| net_count(in_total, out_total));
        let artifacts = [
            (ArtifactKind::Csv, &self.csv_path),
            (ArtifactKind::AnnotatedVideo, &self.annotated_path),
        ]
        .into_iter()
        .filter_map(|(kind, path)| {
            path.as_ref()
                .filter(|p| !p.is_empty())
                .map(|p| ArtifactRef {
                    kind,
                    path: p.clone(),
                })
        })
        .collect();
        FinalTotals {
            in_total,
            out_total,
            net_total,
            windows: self.windows.clone(),
            artifacts,
        }
    }
}

pub fn net_count(in_count: u64, out_count: u64) -> i64 {
    i64::try_from(in_count).unwrap_or(i64::MAX) - i64::try_from(out_count).unwrap_or(i64::MAX)
}

pub fn parse_event(payload: &str) -> Result<FeedEvent, serde_json::Error> {
    serde_json::from_str(payload)
}
