use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DISPLAY_LIMIT: usize = 50;

/// Tunables read from `config.toml`. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of results a search displays.
    pub display_limit: usize,
    pub max_concurrent_fetches: usize,
    pub max_redirects: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_limit: DEFAULT_DISPLAY_LIMIT,
            max_concurrent_fetches: 4,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CurioConfig {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub library_dir: PathBuf,
    pub settings: Settings,
}

impl CurioConfig {
    /// Resolve directories from the environment and load `config.toml`.
    ///
    /// `CURIO_HOME`, `CURIO_CACHE` and `CURIO_LIBRARY` override the defaults
    /// under the platform config directory.
    pub fn load() -> Result<Self> {
        let config_dir = if let Ok(home) = std::env::var("CURIO_HOME") {
            PathBuf::from(home)
        } else {
            dirs::config_dir()
                .context("Could not find config directory")?
                .join("curio")
        };

        let cache_dir = std::env::var("CURIO_CACHE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir.join("cache"));
        let library_dir = std::env::var("CURIO_LIBRARY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir.join("library"));

        Self::from_dirs(config_dir, cache_dir, library_dir)
    }

    /// Lay everything out under a single root.
    pub fn at(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        Self::from_dirs(root.to_path_buf(), root.join("cache"), root.join("library"))
    }

    pub fn from_dirs(
        config_dir: PathBuf,
        cache_dir: PathBuf,
        library_dir: PathBuf,
    ) -> Result<Self> {
        fs::create_dir_all(&config_dir)?;
        fs::create_dir_all(&cache_dir)?;
        fs::create_dir_all(&library_dir)?;

        let settings_path = config_dir.join("config.toml");
        let settings = if settings_path.exists() {
            let content = fs::read_to_string(&settings_path)?;
            toml::from_str(&content)
                .with_context(|| format!("Invalid settings in {:?}", settings_path))?
        } else {
            Settings::default()
        };
        log::debug!(
            "config {:?}, cache {:?}, library {:?}",
            config_dir,
            cache_dir,
            library_dir
        );

        Ok(Self {
            config_dir,
            cache_dir,
            library_dir,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_settings_file() -> Result<()> {
        let root = tempfile::tempdir()?;
        let config = CurioConfig::at(root.path())?;
        assert_eq!(config.settings, Settings::default());
        assert!(config.cache_dir.is_dir());
        assert!(config.library_dir.is_dir());
        Ok(())
    }

    #[test]
    fn settings_file_overrides_some_keys() -> Result<()> {
        let root = tempfile::tempdir()?;
        fs::write(root.path().join("config.toml"), "display_limit = 12\n")?;
        let config = CurioConfig::at(root.path())?;
        assert_eq!(config.settings.display_limit, 12);
        assert_eq!(config.settings.max_redirects, 5);
        Ok(())
    }

    #[test]
    fn malformed_settings_are_reported() -> Result<()> {
        let root = tempfile::tempdir()?;
        fs::write(root.path().join("config.toml"), "display_limit = \"many\"\n")?;
        assert!(CurioConfig::at(root.path()).is_err());
        Ok(())
    }
}
