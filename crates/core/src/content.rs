use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentState {
    Queued,
    Running,
    Cached,
    Failed,
}

impl ContentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContentState::Cached | ContentState::Failed)
    }
}

/// A fetcher's record of fetched content, keyed by URL.
///
/// `filepath`, `length` and `content_type` only carry meaning once the
/// record is [`ContentState::Cached`]. Terminal records are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub url: String,
    pub state: ContentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<PathBuf>,
    #[serde(default)]
    pub length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ContentRecord {
    pub fn cached(
        id: impl Into<String>,
        url: impl Into<String>,
        filepath: PathBuf,
        length: u64,
        content_type: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            state: ContentState::Cached,
            filepath: Some(filepath),
            length,
            content_type,
            error: None,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn failed(id: impl Into<String>, url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            state: ContentState::Failed,
            filepath: None,
            length: 0,
            content_type: None,
            error: Some(error.into()),
            fetched_at: Some(Utc::now()),
        }
    }

    /// The local file, if and only if the content is cached.
    pub fn cached_path(&self) -> Option<&PathBuf> {
        match self.state {
            ContentState::Cached => self.filepath.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queuing,
    Running,
    Done,
}

/// An outstanding fetch for a URL, with progress counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTask {
    pub url: String,
    pub state: TaskState,
    pub fetched_size: u64,
    /// `None` when the server did not announce a length.
    pub content_length: Option<u64>,
}

impl FetchTask {
    pub fn queuing(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: TaskState::Queuing,
            fetched_size: 0,
            content_length: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TaskState::Queuing | TaskState::Running)
    }

    /// Fraction in `0.0..=1.0`, if the total is known.
    pub fn progress(&self) -> Option<f64> {
        match self.content_length {
            Some(0) => Some(1.0),
            Some(total) => Some((self.fetched_size as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}
