use curio_core::CurioError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Thumbnail bytes loaded for one asset.
#[derive(Debug, PartialEq, Eq)]
pub struct Preview {
    pub asset_id: String,
    pub path: PathBuf,
    pub data: Vec<u8>,
}

/// Loaded thumbnails keyed by asset id. Each id is loaded at most once until
/// released.
///
/// After [`shutdown`](PreviewCache::shutdown) every load is refused.
pub struct PreviewCache {
    previews: Mutex<Option<HashMap<String, Arc<Preview>>>>,
}

impl Default for PreviewCache {
    fn default() -> Self {
        Self {
            previews: Mutex::new(Some(HashMap::new())),
        }
    }
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<HashMap<String, Arc<Preview>>>> {
        self.previews.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the image at `path` for `asset_id`, unless one is already loaded.
    ///
    /// The file is read without holding the cache lock. When two loads for
    /// the same id race, the first one stored wins.
    pub fn load(&self, asset_id: &str, path: &Path) -> Result<Arc<Preview>, CurioError> {
        let loaded = self
            .lock()
            .as_ref()
            .ok_or(CurioError::Shutdown)?
            .get(asset_id)
            .cloned();
        if let Some(existing) = loaded {
            return Ok(existing);
        }

        let data = std::fs::read(path)?;
        let preview = Arc::new(Preview {
            asset_id: asset_id.to_string(),
            path: path.to_path_buf(),
            data,
        });

        let mut guard = self.lock();
        let previews = guard.as_mut().ok_or(CurioError::Shutdown)?;
        Ok(previews
            .entry(asset_id.to_string())
            .or_insert(preview)
            .clone())
    }

    pub fn get(&self, asset_id: &str) -> Option<Arc<Preview>> {
        self.lock().as_ref()?.get(asset_id).cloned()
    }

    pub fn contains(&self, asset_id: &str) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|previews| previews.contains_key(asset_id))
    }

    pub fn release(&self, asset_id: &str) -> Option<Arc<Preview>> {
        self.lock().as_mut()?.remove(asset_id)
    }

    /// Drop every preview and refuse further loads.
    pub fn shutdown(&self) {
        if let Some(previews) = self.lock().take() {
            log::debug!("released {} previews on shutdown", previews.len());
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().is_none()
    }

    pub fn len(&self) -> usize {
        self.lock().as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_once_per_asset() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");
        fs::write(&first, b"one")?;
        fs::write(&second, b"two")?;

        let cache = PreviewCache::new();
        let a = cache.load("asset", &first)?;
        let b = cache.load("asset", &second)?;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.data, b"one");
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn release_allows_reload() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("p.png");
        fs::write(&path, b"old")?;

        let cache = PreviewCache::new();
        cache.load("asset", &path)?;
        assert!(cache.release("asset").is_some());
        assert!(!cache.contains("asset"));

        fs::write(&path, b"new")?;
        assert_eq!(cache.load("asset", &path)?.data, b"new");
        Ok(())
    }

    #[test]
    fn shutdown_refuses_loads() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("p.png");
        fs::write(&path, b"x")?;

        let cache = PreviewCache::new();
        cache.load("asset", &path)?;
        cache.shutdown();

        assert!(cache.is_shut_down());
        assert!(cache.is_empty());
        assert!(matches!(cache.load("asset", &path), Err(CurioError::Shutdown)));
        Ok(())
    }

    #[test]
    fn unreadable_file_is_not_registered() {
        let cache = PreviewCache::new();
        assert!(cache.load("asset", Path::new("/nonexistent/curio.png")).is_err());
        assert!(!cache.contains("asset"));
    }
}
