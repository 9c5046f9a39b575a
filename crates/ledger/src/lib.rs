//! # Ledger: The Catalog
//!
//! **Asset metadata, extraction tracking and the import action.**
//!
//! The ledger knows every asset a user can browse. It answers whether an asset
//! has already been unpacked into the local library and performs the import
//! once an archive is available.
//!
//! ## Layout
//!
//! - Built-in assets ship inside the crate; users extend or override them with
//!   `<config>/assets.toml`.
//! - Extracted assets live under `<library>/<asset id>/`, next to a
//!   `.curio-extracted` marker.
//!
//! ```no_run
//! use curio_core::{AssetCatalog, CurioConfig};
//! use curio_ledger::AssetLedger;
//!
//! #[async_std::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ledger = AssetLedger::new(&CurioConfig::load()?)?;
//!     for asset in ledger.assets() {
//!         println!("{} extracted={}", asset.name, ledger.is_extracted(&asset.id));
//!     }
//!     Ok(())
//! }
//! ```

/// Unpacking archives into the library.
pub mod extract;

/// Layered asset registry.
pub mod registry;

pub use registry::AssetRegistry;

use anyhow::Result;
use async_trait::async_trait;
use curio_core::{Asset, AssetCatalog, CurioConfig, CurioError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct AssetLedger {
    registry: AssetRegistry,
    library_dir: PathBuf,
}

impl AssetLedger {
    pub fn new(config: &CurioConfig) -> Result<Self> {
        Ok(Self::with_registry(
            AssetRegistry::new(config)?,
            &config.library_dir,
        ))
    }

    pub fn with_registry(registry: AssetRegistry, library_dir: &Path) -> Self {
        Self {
            registry,
            library_dir: library_dir.to_path_buf(),
        }
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AssetRegistry {
        &mut self.registry
    }
}

#[async_trait]
impl AssetCatalog for AssetLedger {
    fn get(&self, id: &str) -> Option<Arc<Asset>> {
        self.registry.get(id)
    }

    fn assets(&self) -> Vec<Arc<Asset>> {
        self.registry.assets().cloned().collect()
    }

    fn is_extracted(&self, id: &str) -> bool {
        extract::is_extracted(&self.library_dir, id)
    }

    fn resolve_path(&self, id: &str) -> PathBuf {
        extract::asset_dir(&self.library_dir, id)
    }

    async fn execute_import_action(
        &self,
        id: &str,
        archive: Option<&Path>,
    ) -> Result<PathBuf, CurioError> {
        if self.registry.get(id).is_none() {
            return Err(CurioError::MissingAsset(id.to_string()));
        }

        if self.is_extracted(id) {
            log::info!("{} already extracted, importing in place", id);
            return Ok(self.resolve_path(id));
        }

        match archive {
            Some(archive) => {
                log::info!("extracting {} from {:?}", id, archive);
                extract::extract(&self.library_dir, id, archive).await
            }
            None => Err(CurioError::NotCached(id.to_string())),
        }
    }
}
