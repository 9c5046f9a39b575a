use anyhow::{Context, Result};
use curio_core::{ContentRecord, ContentState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const INDEX_FILE: &str = "contents.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    contents: Vec<ContentRecord>,
}

/// Cached records from a previous session whose files are still on disk.
pub fn load(cache_dir: &Path) -> Result<HashMap<String, ContentRecord>> {
    let index_path = cache_dir.join(INDEX_FILE);
    if !index_path.exists() {
        return Ok(HashMap::new());
    }

    let content = std::fs::read_to_string(&index_path)?;
    let parsed: IndexFile = match toml::from_str(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("ignoring unreadable content index {:?}: {}", index_path, e);
            return Ok(HashMap::new());
        }
    };

    Ok(parsed
        .contents
        .into_iter()
        .filter(|r| r.state == ContentState::Cached)
        .filter(|r| r.filepath.as_ref().is_some_and(|p| p.is_file()))
        .map(|r| (r.url.clone(), r))
        .collect())
}

pub async fn save(cache_dir: &Path, mut records: Vec<ContentRecord>) -> Result<()> {
    records.sort_by(|a, b| a.url.cmp(&b.url));
    let content = toml::to_string(&IndexFile { contents: records })?;

    let tmp = cache_dir.join(format!("{}.tmp", INDEX_FILE));
    async_std::fs::write(&tmp, content)
        .await
        .with_context(|| format!("writing {:?}", tmp))?;
    async_std::fs::rename(&tmp, cache_dir.join(INDEX_FILE)).await?;
    Ok(())
}
