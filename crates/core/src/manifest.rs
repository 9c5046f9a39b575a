use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    ModelMmd,
    ModelXps,
    Motion,
    Pose,
    Lighting,
    Material,
    World,
}

impl AssetType {
    pub const ALL: [AssetType; 7] = [
        AssetType::ModelMmd,
        AssetType::ModelXps,
        AssetType::Motion,
        AssetType::Pose,
        AssetType::Lighting,
        AssetType::Material,
        AssetType::World,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::ModelMmd => "model_mmd",
            AssetType::ModelXps => "model_xps",
            AssetType::Motion => "motion",
            AssetType::Pose => "pose",
            AssetType::Lighting => "lighting",
            AssetType::Material => "material",
            AssetType::World => "world",
        }
    }
}

impl std::str::FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown asset type '{}'", s))
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a downloadable asset.
///
/// Assets are owned by a catalog and never mutated by the core. The two URLs
/// double as cache keys for the content fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
    pub thumbnail_url: String,
    pub download_url: String,
    /// Alternate names keyed by language. Must stay after all scalar fields (TOML sub-table).
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(skip)]
    keywords: String,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        asset_type: AssetType,
        name: impl Into<String>,
        thumbnail_url: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        let mut asset = Self {
            id: id.into(),
            asset_type,
            name: name.into(),
            tags: Vec::new(),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            note: String::new(),
            thumbnail_url: thumbnail_url.into(),
            download_url: download_url.into(),
            aliases: BTreeMap::new(),
            keywords: String::new(),
        };
        asset.index_keywords();
        asset
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self.index_keywords();
        self
    }

    pub fn with_alias(mut self, lang: impl Into<String>, alias: impl Into<String>) -> Self {
        self.aliases.insert(lang.into(), alias.into());
        self.index_keywords();
        self
    }

    /// Recompute the lowercase search keywords from name, aliases and tags.
    ///
    /// Catalogs call this once when an asset is loaded from disk, since the
    /// keywords are not serialized.
    pub fn index_keywords(&mut self) {
        let mut parts = Vec::with_capacity(1 + self.aliases.len() + self.tags.len());
        parts.push(self.name.as_str());
        parts.extend(self.aliases.values().map(String::as_str));
        parts.extend(self.tags.iter().map(String::as_str));
        self.keywords = parts.join(" ").to_lowercase();
    }

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn tag_names(&self) -> BTreeSet<&str> {
        self.tags.iter().map(String::as_str).collect()
    }

    pub fn tags_text(&self) -> String {
        self.tags.join(", ")
    }
}

/// Filters applied by a search run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub asset_type: AssetType,
    /// Substring filter, compared case-insensitively against keywords.
    pub text: String,
    /// Enabled tags. An asset must carry every one of them.
    pub tags: BTreeSet<String>,
    pub cached_only: bool,
}

impl SearchQuery {
    pub fn new(asset_type: AssetType) -> Self {
        Self {
            asset_type,
            text: String::new(),
            tags: BTreeSet::new(),
            cached_only: false,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn cached_only(mut self, cached_only: bool) -> Self {
        self.cached_only = cached_only;
        self
    }

    /// Category, tag and keyword checks. Importability is left to the
    /// caller because it depends on collaborator state.
    pub fn matches_metadata(&self, asset: &Asset) -> bool {
        if asset.asset_type != self.asset_type {
            return false;
        }
        let tag_names = asset.tag_names();
        if !self.tags.iter().all(|t| tag_names.contains(t.as_str())) {
            return false;
        }
        asset.keywords().contains(&self.text.to_lowercase())
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::new(AssetType::ModelMmd)
    }
}
