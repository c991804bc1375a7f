//! Release and asset payloads of the Gitea release API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tagged release on the remote forge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    /// Gitea sends `null` instead of `[]` for releases without attachments
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Find an attached asset by its (already sanitized) name
    pub fn asset_named(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// A file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: u64,
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    #[serde(rename = "browser_download_url", default)]
    pub download_url: String,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request body for creating a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReleaseOptions {
    pub tag_name: String,
    pub name: String,
    pub draft: bool,
    pub prerelease: bool,
}

/// Outcome of searching the release listing for a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseLookup {
    Found(Release),
    NotFound,
}

impl ReleaseLookup {
    /// Pick the release whose tag exactly matches `tag_name`
    pub fn from_listing(releases: Vec<Release>, tag_name: &str) -> Self {
        releases
            .into_iter()
            .find(|release| release.tag_name == tag_name)
            .map_or(Self::NotFound, Self::Found)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
