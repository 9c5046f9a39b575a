use crate::previews::PreviewCache;
use crate::state;
use curio_core::{
    AssetCatalog, ContentFetcher, ContentRecord, CurioEvent, Generation, SearchQuery,
};
use futures::channel::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Results of the current search run.
///
/// `asset_ids` grows in thumbnail arrival order, not catalog order, and only
/// while `generation` is the active one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub generation: Generation,
    /// Every asset the query matched.
    pub hit_count: usize,
    /// How many of the hits were sent for thumbnails.
    pub display_count: usize,
    pub asset_ids: Vec<String>,
}

impl SearchResult {
    /// Thumbnails are still outstanding for this run.
    pub fn is_loading(&self) -> bool {
        self.asset_ids.len() < self.display_count
    }
}

/// State shared with in-flight thumbnail completions.
struct Epoch {
    result: Mutex<SearchResult>,
    previews: Arc<PreviewCache>,
    events: mpsc::UnboundedSender<CurioEvent>,
}

impl Epoch {
    fn lock(&self) -> MutexGuard<'_, SearchResult> {
        self.result.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_thumbnail_fetched(
        &self,
        generation: Generation,
        asset_id: String,
        content: ContentRecord,
    ) {
        {
            let mut result = self.lock();
            if result.generation != generation {
                log::trace!(
                    "dropping thumbnail for {} from {} (current {})",
                    asset_id,
                    generation,
                    result.generation
                );
                return;
            }
            result.asset_ids.push(asset_id.clone());
        }

        // Disk reads happen with the result unlocked
        match content.cached_path() {
            Some(path) => {
                if let Err(e) = self.previews.load(&asset_id, path) {
                    log::warn!("could not load thumbnail for {}: {}", asset_id, e);
                }
            }
            None => log::warn!(
                "thumbnail for {} not available: {}",
                asset_id,
                content.error.as_deref().unwrap_or("no cached file")
            ),
        }

        let _ = self.events.unbounded_send(CurioEvent::ResultAppended {
            generation,
            asset_id,
        });
    }
}

/// Runs searches and collects their thumbnails, one generation at a time.
///
/// Every [`search`](SearchCoordinator::search) supersedes the previous run.
/// Completions from older runs may still arrive; they are discarded on
/// delivery rather than cancelled.
pub struct SearchCoordinator {
    catalog: Arc<dyn AssetCatalog>,
    fetcher: Arc<dyn ContentFetcher>,
    epoch: Arc<Epoch>,
    display_limit: usize,
}

impl SearchCoordinator {
    pub fn new(
        catalog: Arc<dyn AssetCatalog>,
        fetcher: Arc<dyn ContentFetcher>,
        previews: Arc<PreviewCache>,
        events: mpsc::UnboundedSender<CurioEvent>,
        display_limit: usize,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            epoch: Arc::new(Epoch {
                result: Mutex::new(SearchResult::default()),
                previews,
                events,
            }),
            display_limit,
        }
    }

    /// Start a new run for `query` and return its generation.
    ///
    /// Filtering and the result reset happen before this returns; thumbnails
    /// arrive later through the fetcher.
    pub fn search(&self, query: &SearchQuery) -> Generation {
        let hits: Vec<_> = self
            .catalog
            .assets()
            .into_iter()
            .filter(|asset| query.matches_metadata(asset))
            .filter(|asset| {
                !query.cached_only
                    || state::is_importable(asset, self.catalog.as_ref(), self.fetcher.as_ref())
            })
            .collect();

        let hit_count = hits.len();
        let display_count = hit_count.min(self.display_limit);

        let generation = {
            let mut result = self.epoch.lock();
            let generation = result.generation.next();
            *result = SearchResult {
                generation,
                hit_count,
                display_count,
                asset_ids: Vec::with_capacity(display_count),
            };
            let _ = self.epoch.events.unbounded_send(CurioEvent::SearchStarted {
                generation,
                hit_count,
                display_count,
            });
            generation
        };
        log::debug!(
            "search {} for {:?}: {} of {} results",
            generation,
            query,
            display_count,
            hit_count
        );

        // The lock is released here: fetchers may complete synchronously
        for asset in hits.into_iter().take(display_count) {
            let epoch = self.epoch.clone();
            let asset_id = asset.id.clone();
            self.fetcher.async_get_content(
                &asset.thumbnail_url,
                Box::new(move |content| epoch.on_thumbnail_fetched(generation, asset_id, content)),
            );
        }

        generation
    }

    pub fn current_result(&self) -> SearchResult {
        self.epoch.lock().clone()
    }

    pub fn current_generation(&self) -> Generation {
        self.epoch.lock().generation
    }

    pub fn display_limit(&self) -> usize {
        self.display_limit
    }
}
