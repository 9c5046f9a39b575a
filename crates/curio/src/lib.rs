//! # Curio: The Collector
//!
//! **Browse an asset catalog, fetch thumbnails and archives, and follow each
//! asset from first download to local import.**
//!
//! `Curio` coordinates two collaborators it does not implement itself: an
//! [`AssetCatalog`] (metadata, extraction, import) and a [`ContentFetcher`]
//! (asynchronous fetch-and-cache). By default those are `curio-ledger` and
//! `curio-hoard`, wired together by [`Curio::open`].
//!
//! ## Searching
//!
//! Each [`Curio::search`] starts a new generation. Thumbnails for the matches
//! arrive asynchronously and are appended to [`Curio::current_result`] in
//! arrival order. A completion that belongs to an older generation is dropped,
//! so a user re-running a search never sees a mix of runs.
//!
//! ```no_run
//! use curio::Curio;
//! use curio_core::{AssetType, CurioConfig, CurioEvent, SearchQuery};
//! use futures::StreamExt;
//!
//! #[async_std::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (curio, mut events) = Curio::open(&CurioConfig::load()?)?;
//!     let generation = curio.search(&SearchQuery::new(AssetType::ModelMmd).text("miku"));
//!
//!     while let Some(event) = events.next().await {
//!         if let CurioEvent::ResultAppended { asset_id, .. } = event {
//!             let status = curio.resolve_state(&asset_id)?;
//!             println!("{} {:?}", asset_id, status.state);
//!         }
//!         if !curio.current_result().is_loading() {
//!             break;
//!         }
//!     }
//!     println!("{} done", generation);
//!     Ok(())
//! }
//! ```
//!
//! ## Acquisition
//!
//! Acquisition state is never stored. [`Curio::resolve_state`] derives it on
//! every call from the catalog and fetcher snapshots, and the commands
//! ([`Curio::download`], [`Curio::import`]) only forward to them.

/// Download, cancel and import commands.
pub mod actions;

/// Thumbnail previews with an explicit lifecycle.
pub mod previews;

/// Generation-scoped search runs.
pub mod search;

/// Acquisition state derivation.
pub mod state;

pub use actions::{AcquisitionDispatcher, AssetDetail};
pub use previews::{Preview, PreviewCache};
pub use search::{SearchCoordinator, SearchResult};
pub use state::{AssetAction, AssetStatus};

pub use curio_core as core;
#[cfg(feature = "defaults")]
pub use curio_hoard as hoard;
#[cfg(feature = "defaults")]
pub use curio_ledger as ledger;

use curio_core::config::DEFAULT_DISPLAY_LIMIT;
use curio_core::{AssetCatalog, ContentFetcher, CurioError, CurioEvent, Generation, SearchQuery};
use futures::channel::mpsc;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Curio {
    catalog: Arc<dyn AssetCatalog>,
    fetcher: Arc<dyn ContentFetcher>,
    previews: Arc<PreviewCache>,
    search: SearchCoordinator,
    dispatcher: AcquisitionDispatcher,
}

impl Curio {
    /// Build over the given collaborators. The receiver yields every
    /// [`CurioEvent`]; dropping it is allowed.
    pub fn new(
        catalog: Arc<dyn AssetCatalog>,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> (Self, mpsc::UnboundedReceiver<CurioEvent>) {
        Self::with_display_limit(catalog, fetcher, DEFAULT_DISPLAY_LIMIT)
    }

    pub fn with_display_limit(
        catalog: Arc<dyn AssetCatalog>,
        fetcher: Arc<dyn ContentFetcher>,
        display_limit: usize,
    ) -> (Self, mpsc::UnboundedReceiver<CurioEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded();
        let previews = Arc::new(PreviewCache::new());

        let search = SearchCoordinator::new(
            catalog.clone(),
            fetcher.clone(),
            previews.clone(),
            events_tx.clone(),
            display_limit,
        );
        let dispatcher = AcquisitionDispatcher::new(catalog.clone(), fetcher.clone(), events_tx);

        (
            Self {
                catalog,
                fetcher,
                previews,
                search,
                dispatcher,
            },
            events_rx,
        )
    }

    /// Open the default ledger catalog and hoard cache described by `config`.
    #[cfg(feature = "defaults")]
    pub fn open(
        config: &curio_core::CurioConfig,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<CurioEvent>)> {
        let catalog = Arc::new(curio_ledger::AssetLedger::new(config)?);
        let fetcher = Arc::new(curio_hoard::ContentCache::new(config)?);
        Ok(Self::with_display_limit(
            catalog,
            fetcher,
            config.settings.display_limit,
        ))
    }

    pub fn search(&self, query: &SearchQuery) -> Generation {
        self.search.search(query)
    }

    pub fn current_result(&self) -> SearchResult {
        self.search.current_result()
    }

    pub fn resolve_state(&self, asset_id: &str) -> Result<AssetStatus, CurioError> {
        self.dispatcher.resolve(asset_id)
    }

    pub fn detail(&self, asset_id: &str) -> Result<AssetDetail, CurioError> {
        self.dispatcher.detail(asset_id)
    }

    pub fn download(&self, asset_id: &str) -> Result<(), CurioError> {
        self.dispatcher.download(asset_id)
    }

    pub fn can_cancel_download(&self, asset_id: &str) -> bool {
        self.dispatcher.can_cancel_download(asset_id)
    }

    pub fn cancel_download(&self, asset_id: &str) -> Result<(), CurioError> {
        self.dispatcher.cancel_download(asset_id)
    }

    pub async fn import(&self, asset_id: &str) -> Result<PathBuf, CurioError> {
        self.dispatcher.import(asset_id).await
    }

    pub fn previews(&self) -> &PreviewCache {
        &self.previews
    }

    pub fn catalog(&self) -> &Arc<dyn AssetCatalog> {
        &self.catalog
    }

    pub fn fetcher(&self) -> &Arc<dyn ContentFetcher> {
        &self.fetcher
    }

    /// Release loaded previews. Searches keep working but load no more
    /// thumbnails.
    pub fn shutdown(&self) {
        self.previews.shutdown();
    }
}
