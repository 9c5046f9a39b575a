#![allow(dead_code)]

use async_trait::async_trait;
use curio_core::{
    Asset, AssetCatalog, AssetType, ContentFetcher, ContentRecord, CurioError, CurioEvent,
    FetchTask, OnContent,
};
use futures::channel::mpsc;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub fn asset(id: &str, asset_type: AssetType, tags: &[&str]) -> Asset {
    Asset::new(
        id,
        asset_type,
        format!("Asset {}", id),
        format!("https://example.com/thumbs/{id}.png"),
        format!("https://example.com/archives/{id}.zip"),
    )
    .with_tags(tags.iter().copied())
}

/// Catalog over a fixed asset list, recording import calls.
#[derive(Default)]
pub struct FakeCatalog {
    assets: Vec<Arc<Asset>>,
    extracted: Mutex<HashSet<String>>,
    pub imports: Mutex<Vec<(String, Option<PathBuf>)>>,
}

impl FakeCatalog {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self {
            assets: assets.into_iter().map(Arc::new).collect(),
            ..Default::default()
        }
    }

    pub fn mark_extracted(&self, id: &str) {
        self.extracted.lock().unwrap().insert(id.to_string());
    }
}

#[async_trait]
impl AssetCatalog for FakeCatalog {
    fn get(&self, id: &str) -> Option<Arc<Asset>> {
        self.assets.iter().find(|a| a.id == id).cloned()
    }

    fn assets(&self) -> Vec<Arc<Asset>> {
        self.assets.clone()
    }

    fn is_extracted(&self, id: &str) -> bool {
        self.extracted.lock().unwrap().contains(id)
    }

    fn resolve_path(&self, id: &str) -> PathBuf {
        PathBuf::from("/library").join(id)
    }

    async fn execute_import_action(
        &self,
        id: &str,
        archive: Option<&Path>,
    ) -> Result<PathBuf, CurioError> {
        self.imports
            .lock()
            .unwrap()
            .push((id.to_string(), archive.map(Path::to_path_buf)));
        if archive.is_none() && !self.is_extracted(id) {
            return Err(CurioError::NotCached(id.to_string()));
        }
        Ok(self.resolve_path(id))
    }
}

/// Fetcher whose completions are held until a test delivers them.
///
/// URLs with a stored `Cached` record complete synchronously, like a real
/// cache hit.
#[derive(Default)]
pub struct DeferredFetcher {
    contents: Mutex<HashMap<String, ContentRecord>>,
    tasks: Mutex<HashMap<String, FetchTask>>,
    pending: Mutex<Vec<(String, OnContent)>>,
    pub requested: Mutex<Vec<String>>,
}

impl DeferredFetcher {
    pub fn set_content(&self, record: ContentRecord) {
        self.contents
            .lock()
            .unwrap()
            .insert(record.url.clone(), record);
    }

    pub fn set_task(&self, task: FetchTask) {
        self.tasks.lock().unwrap().insert(task.url.clone(), task);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// Take every held completion, in request order.
    pub fn take_pending(&self) -> Vec<(String, OnContent)> {
        std::mem::take(&mut *self.pending.lock().unwrap())
    }

    /// Complete every held request with a cached record whose file is `file`.
    pub fn deliver_all(&self, file: &Path) {
        for (url, on_done) in self.take_pending() {
            on_done(cached(&url, file));
        }
    }
}

impl ContentFetcher for DeferredFetcher {
    fn try_get_content(&self, url: &str) -> Option<ContentRecord> {
        self.contents.lock().unwrap().get(url).cloned()
    }

    fn try_get_task(&self, url: &str) -> Option<FetchTask> {
        self.tasks.lock().unwrap().get(url).cloned()
    }

    fn async_get_content(&self, url: &str, on_done: OnContent) {
        self.requested.lock().unwrap().push(url.to_string());
        let hit = self
            .contents
            .lock()
            .unwrap()
            .get(url)
            .filter(|r| r.cached_path().is_some())
            .cloned();
        match hit {
            Some(record) => on_done(record),
            None => self.pending.lock().unwrap().push((url.to_string(), on_done)),
        }
    }
}

pub fn cached(url: &str, file: &Path) -> ContentRecord {
    ContentRecord::cached(
        format!("id-{}", url.len()),
        url,
        file.to_path_buf(),
        3,
        Some("image/png".to_string()),
    )
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<CurioEvent>) -> Vec<CurioEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = rx.try_next() {
        events.push(event);
    }
    events
}

pub fn thumbnail_file(dir: &Path) -> PathBuf {
    let path = dir.join("thumb.png");
    std::fs::write(&path, b"png").unwrap();
    path
}
