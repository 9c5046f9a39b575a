use chrono::{DateTime, Utc};
use curio_core::CurioError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Written into an asset directory once extraction has finished.
pub const MARKER_FILE: &str = ".curio-extracted";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMarker {
    pub asset_id: String,
    pub source: PathBuf,
    pub extracted_at: DateTime<Utc>,
}

pub fn asset_dir(library_dir: &Path, id: &str) -> PathBuf {
    library_dir.join(id)
}

pub fn is_extracted(library_dir: &Path, id: &str) -> bool {
    asset_dir(library_dir, id).join(MARKER_FILE).is_file()
}

pub fn read_marker(library_dir: &Path, id: &str) -> Result<Option<ExtractionMarker>, CurioError> {
    let path = asset_dir(library_dir, id).join(MARKER_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Copy `archive` into the asset's library directory and mark it extracted.
/// The archive is stored as-is, not unpacked.
///
/// The marker is written last, so an interrupted extraction is never
/// reported as extracted.
pub async fn extract(library_dir: &Path, id: &str, archive: &Path) -> Result<PathBuf, CurioError> {
    let dir = asset_dir(library_dir, id);
    let file_name = archive.file_name().ok_or_else(|| {
        CurioError::Manifest(format!("Archive path {:?} has no file name", archive))
    })?;

    async_std::fs::create_dir_all(&dir).await?;
    let copied = async_std::fs::copy(archive, dir.join(file_name)).await?;
    log::debug!("copied {} bytes from {:?} into {:?}", copied, archive, dir);

    let marker = ExtractionMarker {
        asset_id: id.to_string(),
        source: archive.to_path_buf(),
        extracted_at: Utc::now(),
    };
    let content = toml::to_string(&marker).map_err(|e| CurioError::Manifest(e.to_string()))?;
    async_std::fs::write(dir.join(MARKER_FILE), content).await?;

    Ok(dir)
}
