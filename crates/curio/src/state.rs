use curio_core::{
    AcquisitionState, Asset, AssetCatalog, ContentFetcher, ContentRecord, ContentState, FetchTask,
};

/// Acquisition state of one asset, with the record or task it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStatus {
    pub state: AcquisitionState,
    pub content: Option<ContentRecord>,
    pub task: Option<FetchTask>,
}

impl AssetStatus {
    fn bare(state: AcquisitionState) -> Self {
        Self {
            state,
            content: None,
            task: None,
        }
    }

    fn with_content(state: AcquisitionState, content: ContentRecord) -> Self {
        Self {
            state,
            content: Some(content),
            task: None,
        }
    }

    fn with_task(state: AcquisitionState, task: FetchTask) -> Self {
        Self {
            state,
            content: None,
            task: Some(task),
        }
    }

    /// The one action a user is offered in this state.
    pub fn action(&self) -> AssetAction {
        match self.state {
            AcquisitionState::Initialized => AssetAction::Download,
            AcquisitionState::Downloading => AssetAction::CancelDownload,
            AcquisitionState::Cached | AcquisitionState::Extracted => AssetAction::Import,
            AcquisitionState::Failed | AcquisitionState::Unknown => AssetAction::Retry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetAction {
    Download,
    /// Offered while downloading but never enabled: fetches cannot be interrupted.
    CancelDownload,
    Import,
    /// Download again after a failure or an unrecognized state.
    Retry,
}

impl AssetAction {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AssetAction::CancelDownload)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetAction::Download => "Download",
            AssetAction::CancelDownload => "Cancel",
            AssetAction::Import => "Import",
            AssetAction::Retry => "Retry",
        }
    }
}

/// Derive the acquisition state of `asset` from the collaborators' current
/// snapshot.
///
/// First match wins: extraction, then a terminal content record, then an
/// outstanding task. Nothing is cached between calls.
pub fn resolve(
    asset: &Asset,
    catalog: &dyn AssetCatalog,
    fetcher: &dyn ContentFetcher,
) -> AssetStatus {
    if catalog.is_extracted(&asset.id) {
        return AssetStatus::bare(AcquisitionState::Extracted);
    }

    match fetcher.try_get_content(&asset.download_url) {
        Some(content) => match content.state {
            ContentState::Cached => {
                return AssetStatus::with_content(AcquisitionState::Cached, content)
            }
            ContentState::Failed => {
                return AssetStatus::with_content(AcquisitionState::Failed, content)
            }
            // A live record is not a download in progress; only a task says that
            ContentState::Queued | ContentState::Running => {}
        },
        None => match fetcher.try_get_task(&asset.download_url) {
            None => return AssetStatus::bare(AcquisitionState::Initialized),
            Some(task) if task.is_active() => {
                return AssetStatus::with_task(AcquisitionState::Downloading, task)
            }
            Some(_) => {}
        },
    }

    log::warn!(
        "unrecognized acquisition state for {} ({})",
        asset.id,
        asset.download_url
    );
    AssetStatus::bare(AcquisitionState::Unknown)
}

/// Extracted, or the download URL has cached content. An unfinished
/// download does not count.
pub fn is_importable(
    asset: &Asset,
    catalog: &dyn AssetCatalog,
    fetcher: &dyn ContentFetcher,
) -> bool {
    catalog.is_extracted(&asset.id)
        || fetcher
            .try_get_content(&asset.download_url)
            .is_some_and(|c| c.state == ContentState::Cached)
}
