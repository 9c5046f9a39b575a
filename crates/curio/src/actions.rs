use crate::state::{self, AssetAction, AssetStatus};
use curio_core::{AcquisitionState, Asset, AssetCatalog, ContentFetcher, CurioError, CurioEvent};
use futures::channel::mpsc;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a detail view shows for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDetail {
    pub asset: Arc<Asset>,
    pub status: AssetStatus,
    pub action: AssetAction,
    /// Extraction directory when extracted, archive file when cached.
    pub location: Option<PathBuf>,
}

/// Forwards per-asset commands to the catalog and the fetcher.
///
/// No acquisition state is kept here; it is re-derived on every query.
pub struct AcquisitionDispatcher {
    catalog: Arc<dyn AssetCatalog>,
    fetcher: Arc<dyn ContentFetcher>,
    events: mpsc::UnboundedSender<CurioEvent>,
}

impl AcquisitionDispatcher {
    pub fn new(
        catalog: Arc<dyn AssetCatalog>,
        fetcher: Arc<dyn ContentFetcher>,
        events: mpsc::UnboundedSender<CurioEvent>,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            events,
        }
    }

    fn asset(&self, id: &str) -> Result<Arc<Asset>, CurioError> {
        self.catalog
            .get(id)
            .ok_or_else(|| CurioError::MissingAsset(id.to_string()))
    }

    pub fn resolve(&self, id: &str) -> Result<AssetStatus, CurioError> {
        let asset = self.asset(id)?;
        Ok(state::resolve(&asset, self.catalog.as_ref(), self.fetcher.as_ref()))
    }

    pub fn download(&self, id: &str) -> Result<(), CurioError> {
        let asset = self.asset(id)?;
        log::info!("download requested: {} ({})", asset.name, asset.id);

        let events = self.events.clone();
        let done = asset.clone();
        self.fetcher.async_get_content(
            &asset.download_url,
            Box::new(move |content| {
                log::info!(
                    "done: {}, {}, {:?}, {}",
                    done.name,
                    done.id,
                    content.state,
                    content.id
                );
                let _ = events.unbounded_send(CurioEvent::DownloadFinished {
                    asset_id: done.id.clone(),
                    state: content.state,
                });
            }),
        );
        Ok(())
    }

    /// Fetches cannot be interrupted, so cancelling is never offered.
    pub fn can_cancel_download(&self, _id: &str) -> bool {
        false
    }

    /// Accepted for completeness; leaves any running fetch alone.
    pub fn cancel_download(&self, id: &str) -> Result<(), CurioError> {
        let asset = self.asset(id)?;
        log::info!("cancel requested for {}; fetches are not cancellable", asset.id);
        Ok(())
    }

    /// Hand the asset to the catalog's importer, with the cached archive if
    /// there is one.
    pub async fn import(&self, id: &str) -> Result<PathBuf, CurioError> {
        let asset = self.asset(id)?;
        let archive = self
            .fetcher
            .try_get_content(&asset.download_url)
            .and_then(|content| content.cached_path().cloned());
        log::info!("import requested: {} (archive {:?})", asset.id, archive);

        self.catalog
            .execute_import_action(&asset.id, archive.as_deref())
            .await
    }

    pub fn detail(&self, id: &str) -> Result<AssetDetail, CurioError> {
        let asset = self.asset(id)?;
        let status = state::resolve(&asset, self.catalog.as_ref(), self.fetcher.as_ref());

        let location = match status.state {
            AcquisitionState::Extracted => Some(self.catalog.resolve_path(&asset.id)),
            AcquisitionState::Cached => status
                .content
                .as_ref()
                .and_then(|content| content.cached_path().cloned()),
            _ => None,
        };

        Ok(AssetDetail {
            action: status.action(),
            asset,
            status,
            location,
        })
    }
}
