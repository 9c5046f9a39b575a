use anyhow::{Context, Result};
use curio_core::{Asset, CurioConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_ASSETS: &str = include_str!("assets.toml");

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    assets: Vec<Asset>,
}

impl RegistryFile {
    fn parse(content: &str, origin: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| format!("Invalid asset list in {}", origin))
    }
}

/// Every asset the catalog knows, keyed by id.
///
/// Sources are layered: the built-in list, then the user manifest
/// (`<config>/assets.toml`), then assets recorded at runtime
/// (`<cache>/registry.toml`). Later layers replace earlier entries by id.
pub struct AssetRegistry {
    config_dir: PathBuf,
    cache_dir: PathBuf,
    assets: BTreeMap<String, Arc<Asset>>,
}

impl AssetRegistry {
    pub fn new(config: &CurioConfig) -> Result<Self> {
        let mut registry = Self::empty(&config.config_dir, &config.cache_dir);

        registry.load_defaults()?;
        registry.load_manifest()?;
        registry.load_dynamic()?;

        log::debug!("asset registry holds {} assets", registry.assets.len());
        Ok(registry)
    }

    /// A registry with no built-in assets.
    pub fn empty(config_dir: &Path, cache_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            cache_dir: cache_dir.to_path_buf(),
            assets: BTreeMap::new(),
        }
    }

    fn load_defaults(&mut self) -> Result<()> {
        self.merge(RegistryFile::parse(DEFAULT_ASSETS, "built-in assets")?);
        Ok(())
    }

    fn load_manifest(&mut self) -> Result<()> {
        let manifest_path = self.config_dir.join("assets.toml");
        if manifest_path.exists() {
            let content = fs::read_to_string(&manifest_path)?;
            self.merge(RegistryFile::parse(&content, &manifest_path.to_string_lossy())?);
        }
        Ok(())
    }

    fn load_dynamic(&mut self) -> Result<()> {
        let registry_path = self.cache_dir.join("registry.toml");
        if registry_path.exists() {
            let content = fs::read_to_string(&registry_path)?;
            self.merge(RegistryFile::parse(&content, &registry_path.to_string_lossy())?);
        }
        Ok(())
    }

    fn merge(&mut self, file: RegistryFile) {
        for asset in file.assets {
            self.insert(asset);
        }
    }

    /// Add or replace an asset in memory only.
    pub fn insert(&mut self, mut asset: Asset) {
        asset.index_keywords();
        self.assets.insert(asset.id.clone(), Arc::new(asset));
    }

    /// Add or replace an asset and persist it to `<cache>/registry.toml`.
    pub fn record_asset(&mut self, asset: Asset) -> Result<()> {
        self.insert(asset.clone());

        let registry_path = self.cache_dir.join("registry.toml");
        let mut entries = Vec::new();

        if registry_path.exists() {
            let content = fs::read_to_string(&registry_path)?;
            match toml::from_str::<RegistryFile>(&content) {
                Ok(parsed) => entries = parsed.assets,
                Err(e) => log::warn!("discarding unreadable {:?}: {}", registry_path, e),
            }
        }

        if let Some(pos) = entries.iter().position(|e| e.id == asset.id) {
            entries[pos] = asset;
        } else {
            entries.push(asset);
        }

        let new_content = toml::to_string(&RegistryFile { assets: entries })?;
        fs::write(registry_path, new_content)?;

        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<Asset>> {
        self.assets.get(id).cloned()
    }

    pub fn assets(&self) -> impl Iterator<Item = &Arc<Asset>> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
