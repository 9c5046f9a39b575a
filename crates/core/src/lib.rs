//! # Curio Core: The Vocabulary
//!
//! Shared data model, collaborator contracts and event protocol for the `curio`
//! workspace. Every other crate speaks in these types:
//!
//! - [`manifest`]: static asset metadata and search queries.
//! - [`content`]: records and tasks owned by a content fetcher.
//! - [`protocol`]: generation stamps, acquisition states and pushed events.
//! - [`collaborator`]: the traits the core consumes from its catalog and fetcher.
//! - [`config`]: directory layout and tunables.

pub mod collaborator;
pub mod config;
pub mod content;
pub mod manifest;
pub mod protocol;

pub use collaborator::{AssetCatalog, ContentFetcher, OnContent};
pub use config::{CurioConfig, Settings};
pub use content::{ContentRecord, ContentState, FetchTask, TaskState};
pub use manifest::{Asset, AssetType, SearchQuery};
pub use protocol::{AcquisitionState, CurioEvent, Generation};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CurioError {
    /// A command referenced an asset id the catalog does not know.
    #[error("Asset '{0}' not found in catalog")]
    MissingAsset(String),

    #[error("Asset '{0}' has no cached content to import")]
    NotCached(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Already shut down")]
    Shutdown,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
