use crate::content::ContentState;
use serde::{Deserialize, Serialize};

/// Stamp minted once per search run. Later runs always compare greater.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Generation(u64);

impl Generation {
    /// The following stamp. Saturates at `u64::MAX`: after that many runs a
    /// new search would reuse its predecessor's stamp.
    pub fn next(self) -> Self {
        Generation(self.0.saturating_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Derived acquisition stage of an asset. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcquisitionState {
    Initialized,
    Downloading,
    Cached,
    Extracted,
    Failed,
    Unknown,
}

impl AcquisitionState {
    /// Extracted assets and cached archives can be handed to the importer.
    pub fn is_importable(&self) -> bool {
        matches!(self, AcquisitionState::Cached | AcquisitionState::Extracted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurioEvent {
    /// A new search run became current; earlier results are abandoned
    SearchStarted {
        generation: Generation,
        hit_count: usize,
        display_count: usize,
    },
    /// A thumbnail arrived for the current run; re-render
    ResultAppended {
        generation: Generation,
        asset_id: String,
    },
    /// A user-initiated download reached a terminal state
    DownloadFinished {
        asset_id: String,
        state: ContentState,
    },
}
