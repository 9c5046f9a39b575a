use crate::content::{ContentRecord, FetchTask};
use crate::manifest::Asset;
use crate::CurioError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Completion handed to [`ContentFetcher::async_get_content`].
pub type OnContent = Box<dyn FnOnce(ContentRecord) + Send + 'static>;

/// Asynchronous fetch-and-cache keyed by URL.
///
/// Reads are point-in-time snapshots and must not block.
pub trait ContentFetcher: Send + Sync {
    /// A terminal record for `url`, if one exists.
    fn try_get_content(&self, url: &str) -> Option<ContentRecord>;

    /// The outstanding fetch for `url`, if any.
    fn try_get_task(&self, url: &str) -> Option<FetchTask>;

    /// Start (or join) a fetch of `url`.
    ///
    /// `on_done` runs at most once, possibly before this call returns when the
    /// content is already cached, possibly later on another thread.
    fn async_get_content(&self, url: &str, on_done: OnContent);
}

/// Static asset metadata plus extraction state and the import action.
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    fn get(&self, id: &str) -> Option<Arc<Asset>>;

    /// Every known asset, in a stable order.
    fn assets(&self) -> Vec<Arc<Asset>>;

    fn is_extracted(&self, id: &str) -> bool;

    /// Where the asset lives (or would live) once extracted.
    fn resolve_path(&self, id: &str) -> PathBuf;

    /// Import the asset, extracting `archive` first when given.
    ///
    /// Deciding whether a missing archive is an error is up to the catalog.
    async fn execute_import_action(
        &self,
        id: &str,
        archive: Option<&Path>,
    ) -> Result<PathBuf, CurioError>;
}
