use crate::download;
use crate::index;
use anyhow::Result;
use curio_core::{
    ContentFetcher, ContentRecord, ContentState, CurioConfig, FetchTask, OnContent, TaskState,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Content cache backed by a directory of fetched files.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct ContentCache {
    inner: Arc<Inner>,
}

struct Inner {
    cache_dir: PathBuf,
    client: surf::Client,
    slots: FetchSlots,
    state: Mutex<CacheState>,
    index_lock: async_std::sync::Mutex<()>,
}

#[derive(Default)]
struct CacheState {
    contents: HashMap<String, ContentRecord>,
    pending: HashMap<String, PendingFetch>,
}

struct PendingFetch {
    task: FetchTask,
    waiters: Vec<OnContent>,
}

/// Fixed pool of tokens bounding how many fetches run at once. A limit of
/// zero is raised to one.
struct FetchSlots {
    give: async_channel::Sender<()>,
    take: async_channel::Receiver<()>,
}

struct Slot<'a>(&'a async_channel::Sender<()>);

impl FetchSlots {
    fn new(count: usize) -> Self {
        let count = count.max(1);
        let (give, take) = async_channel::bounded(count);
        for _ in 0..count {
            let _ = give.try_send(());
        }
        Self { give, take }
    }

    async fn acquire(&self) -> Slot<'_> {
        // Both ends live in `self`, so the channel cannot close
        let _ = self.take.recv().await;
        Slot(&self.give)
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        let _ = self.0.try_send(());
    }
}

/// Cache key for a URL, also used as the file stem on disk.
pub fn content_id(url: &str) -> String {
    blake3::hash(url.as_bytes()).to_hex().to_string()
}

fn file_name_for(id: &str, url: &str) -> String {
    let last_segment = url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .unwrap_or_default();
    match Path::new(last_segment).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{}.{}", id, ext.to_ascii_lowercase())
        }
        _ => id.to_string(),
    }
}

impl ContentCache {
    pub fn new(config: &CurioConfig) -> Result<Self> {
        Self::open(
            &config.cache_dir,
            config.settings.max_concurrent_fetches,
            config.settings.max_redirects,
        )
    }

    pub fn open(
        cache_dir: &Path,
        max_concurrent_fetches: usize,
        max_redirects: u8,
    ) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)?;
        let contents = index::load(cache_dir)?;
        log::debug!("content cache {:?} restored {} records", cache_dir, contents.len());

        Ok(Self {
            inner: Arc::new(Inner {
                cache_dir: cache_dir.to_path_buf(),
                client: download::client(max_redirects),
                slots: FetchSlots::new(max_concurrent_fetches),
                state: Mutex::new(CacheState {
                    contents,
                    pending: HashMap::new(),
                }),
                index_lock: async_std::sync::Mutex::new(()),
            }),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.inner.cache_dir
    }
}

impl ContentFetcher for ContentCache {
    fn try_get_content(&self, url: &str) -> Option<ContentRecord> {
        self.inner.lock().contents.get(url).cloned()
    }

    fn try_get_task(&self, url: &str) -> Option<FetchTask> {
        self.inner.lock().pending.get(url).map(|p| p.task.clone())
    }

    fn async_get_content(&self, url: &str, on_done: OnContent) {
        let mut state = self.inner.lock();

        match state.contents.get(url) {
            Some(record) if record.cached_path().is_some_and(|p| p.is_file()) => {
                let record = record.clone();
                drop(state);
                on_done(record);
                return;
            }
            Some(record) => {
                log::debug!("refetching {} (was {:?})", url, record.state);
                state.contents.remove(url);
            }
            None => {}
        }

        if let Some(pending) = state.pending.get_mut(url) {
            pending.waiters.push(on_done);
            return;
        }

        state.pending.insert(
            url.to_string(),
            PendingFetch {
                task: FetchTask::queuing(url),
                waiters: vec![on_done],
            },
        );
        drop(state);

        let inner = self.inner.clone();
        let url = url.to_string();
        async_std::task::spawn(async move { inner.run_fetch(url).await });
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_task(&self, url: &str, update: impl FnOnce(&mut FetchTask)) {
        if let Some(pending) = self.lock().pending.get_mut(url) {
            update(&mut pending.task);
        }
    }

    async fn run_fetch(&self, url: String) {
        let slot = self.slots.acquire().await;
        self.update_task(&url, |task| task.state = TaskState::Running);
        log::debug!("fetching {}", url);

        let id = content_id(&url);
        let path = self.cache_dir.join(file_name_for(&id, &url));
        let result = download::fetch_to_file(&self.client, &url, &path, |fetched, total| {
            self.update_task(&url, |task| {
                task.fetched_size = fetched;
                task.content_length = total;
            })
        })
        .await;
        drop(slot);

        let record = match result {
            Ok(fetched) => {
                log::debug!("cached {} ({} bytes) at {:?}", url, fetched.length, path);
                ContentRecord::cached(id, url.as_str(), path, fetched.length, fetched.content_type)
            }
            Err(e) => {
                log::warn!("fetch of {} failed: {:#}", url, e);
                if path.exists() {
                    let _ = async_std::fs::remove_file(&path).await;
                }
                ContentRecord::failed(id, url.as_str(), format!("{:#}", e))
            }
        };

        let waiters = {
            let mut state = self.lock();
            state.contents.insert(url.clone(), record.clone());
            match state.pending.remove(&url) {
                Some(mut pending) => {
                    pending.task.state = TaskState::Done;
                    pending.waiters
                }
                None => Vec::new(),
            }
        };

        if record.state == ContentState::Cached {
            if let Err(e) = self.persist_index().await {
                log::warn!("could not persist content index: {:#}", e);
            }
        }

        for waiter in waiters {
            waiter(record.clone());
        }
    }

    async fn persist_index(&self) -> Result<()> {
        let _guard = self.index_lock.lock().await;
        let records: Vec<ContentRecord> = self
            .lock()
            .contents
            .values()
            .filter(|r| r.state == ContentState::Cached)
            .cloned()
            .collect();
        index::save(&self.cache_dir, records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn file_names_keep_short_extensions() {
        assert_eq!(file_name_for("abc", "https://h/x/thumb.PNG?v=2"), "abc.png");
        assert_eq!(file_name_for("abc", "https://h/x/archive"), "abc");
        assert_eq!(file_name_for("abc", "https://h/x/a.verylongext"), "abc");
    }

    #[test]
    fn content_ids_are_stable_per_url() {
        assert_eq!(content_id("https://h/a"), content_id("https://h/a"));
        assert_ne!(content_id("https://h/a"), content_id("https://h/b"));
    }

    #[test]
    fn cached_content_completes_synchronously() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let url = "https://example.com/a.png";
        let file = dir.path().join("a.png");
        fs::write(&file, b"png")?;
        let record = ContentRecord::cached(content_id(url), url, file, 3, None);
        async_std::task::block_on(index::save(dir.path(), vec![record.clone()]))?;

        let cache = ContentCache::open(dir.path(), 2, 5)?;
        assert_eq!(cache.try_get_content(url), Some(record));

        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        cache.async_get_content(
            url,
            Box::new(move |r| {
                assert_eq!(r.state, ContentState::Cached);
                flag.store(true, Ordering::SeqCst);
            }),
        );
        assert!(called.load(Ordering::SeqCst));
        assert_eq!(cache.try_get_task(url), None);
        Ok(())
    }
}
