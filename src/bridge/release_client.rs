//! `ReleaseClient` trait: the four release operations the publisher needs
//!
//! Implemented by `GiteaClient` against a live instance and by
//! `MockReleaseClient` in tests.

use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::Result;
use crate::types::{Asset, CreateReleaseOptions, Release, ReleaseLookup};

/// Remote release operations against a single forge
#[async_trait]
pub trait ReleaseClient: Send + Sync {
    /// List the releases of `owner/repo` (first page only)
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>>;

    /// Create a release and return it as stored by the server
    async fn create_release(
        &self,
        owner: &str,
        repo: &str,
        options: &CreateReleaseOptions,
    ) -> Result<Release>;

    /// Delete one asset from whichever release holds it
    async fn delete_release_asset(&self, owner: &str, repo: &str, asset_id: u64) -> Result<()>;

    /// Upload the file at `file_path` as an asset named `file_name`
    async fn upload_release_asset(
        &self,
        owner: &str,
        repo: &str,
        release_id: u64,
        file_path: &Path,
        file_name: &str,
    ) -> Result<Asset>;

    /// Look up a release by exact tag name.
    ///
    /// A missing tag is `ReleaseLookup::NotFound`; only listing failures are
    /// errors.
    async fn find_release(&self, owner: &str, repo: &str, tag_name: &str) -> Result<ReleaseLookup> {
        let releases = self.list_releases(owner, repo).await?;
        Ok(ReleaseLookup::from_listing(releases, tag_name))
    }
}

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static pattern compiles"))
}

/// Replace every character outside `[A-Za-z0-9_.-]` with a hyphen.
///
/// Matches the names the forge assigns to uploaded attachments, so the
/// result is what an existing asset will be called.
pub fn sanitize_name(name: &str) -> String {
    unsafe_chars().replace_all(name, "-").into_owned()
}
