//! Mock ReleaseClient implementation for testing
//!
//! Keeps releases in memory, records every call, and can be told to fail
//! individual operations.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{PublishError, Result};
use crate::types::{Asset, CreateReleaseOptions, Release};

use super::release_client::{sanitize_name, ReleaseClient};

/// Configuration for mock responses
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Releases returned from list_releases; created releases are appended
    pub releases: Vec<Release>,
    /// Fail list_releases with this status text
    pub list_error: Option<String>,
    /// Fail create_release with this status text
    pub create_error: Option<String>,
    /// Fail uploads whose requested file name matches, with this body
    pub upload_errors: Vec<(String, String)>,
    /// Name the "server" reports for uploads, instead of the sanitized name
    pub uploaded_name_override: Option<String>,
    /// Uploads of these file names never finish
    pub parked_uploads: Vec<String>,
}

/// Record of a call made to the mock client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListReleases { owner: String, repo: String },
    CreateRelease { owner: String, repo: String, options: CreateReleaseOptions },
    DeleteAsset { owner: String, repo: String, asset_id: u64 },
    UploadAsset {
        owner: String,
        repo: String,
        release_id: u64,
        file_path: PathBuf,
        file_name: String,
    },
}

impl MockCall {
    fn method(&self) -> &'static str {
        match self {
            Self::ListReleases { .. } => "list_releases",
            Self::CreateRelease { .. } => "create_release",
            Self::DeleteAsset { .. } => "delete_release_asset",
            Self::UploadAsset { .. } => "upload_release_asset",
        }
    }
}

/// A mock implementation of ReleaseClient for testing purposes
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockReleaseClient::new()
///     .with_releases(vec![ReleaseBuilder::new(1, "v1.0.0").with_asset(7, "app.exe").build()]);
///
/// let releases = mock.list_releases("acme", "app").await.unwrap();
/// assert_eq!(releases[0].assets[0].name, "app.exe");
/// ```
#[derive(Clone, Default)]
pub struct MockReleaseClient {
    config: Arc<Mutex<MockConfig>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockReleaseClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_releases(self, releases: Vec<Release>) -> Self {
        self.config.lock().unwrap().releases = releases;
        self
    }

    pub fn with_list_error(self, status: &str) -> Self {
        self.config.lock().unwrap().list_error = Some(status.to_string());
        self
    }

    pub fn with_create_error(self, status: &str) -> Self {
        self.config.lock().unwrap().create_error = Some(status.to_string());
        self
    }

    pub fn with_upload_error(self, file_name: &str, body: &str) -> Self {
        self.config
            .lock()
            .unwrap()
            .upload_errors
            .push((file_name.to_string(), body.to_string()));
        self
    }

    /// Make uploads of `file_name` hang until the task is cancelled
    pub fn with_parked_upload(self, file_name: &str) -> Self {
        self.config
            .lock()
            .unwrap()
            .parked_uploads
            .push(file_name.to_string());
        self
    }

    pub fn with_uploaded_name(self, name: &str) -> Self {
        self.config.lock().unwrap().uploaded_name_override = Some(name.to_string());
        self
    }

    /// Get the call log for verification
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls made to `method`
    pub fn call_count(&self, method: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.method() == method)
            .count()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    /// Current state of a release by id
    pub fn release(&self, release_id: u64) -> Option<Release> {
        self.config
            .lock()
            .unwrap()
            .releases
            .iter()
            .find(|r| r.id == release_id)
            .cloned()
    }

    fn log_call(&self, call: MockCall) {
        self.call_log.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ReleaseClient for MockReleaseClient {
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        self.log_call(MockCall::ListReleases {
            owner: owner.to_string(),
            repo: repo.to_string(),
        });

        let config = self.config.lock().unwrap();
        if let Some(status) = &config.list_error {
            return Err(PublishError::remote("list releases", status.clone()));
        }
        Ok(config.releases.clone())
    }

    async fn create_release(
        &self,
        owner: &str,
        repo: &str,
        options: &CreateReleaseOptions,
    ) -> Result<Release> {
        self.log_call(MockCall::CreateRelease {
            owner: owner.to_string(),
            repo: repo.to_string(),
            options: options.clone(),
        });

        let mut config = self.config.lock().unwrap();
        if let Some(status) = &config.create_error {
            return Err(PublishError::remote("create release", status.clone()));
        }

        let id = config.releases.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let release = ReleaseBuilder::new(id, &options.tag_name)
            .named(&options.name)
            .draft(options.draft)
            .prerelease(options.prerelease)
            .build();
        config.releases.push(release.clone());

        Ok(release)
    }

    async fn delete_release_asset(&self, owner: &str, repo: &str, asset_id: u64) -> Result<()> {
        self.log_call(MockCall::DeleteAsset {
            owner: owner.to_string(),
            repo: repo.to_string(),
            asset_id,
        });

        let mut config = self.config.lock().unwrap();
        let mut found = false;
        for release in &mut config.releases {
            let before = release.assets.len();
            release.assets.retain(|a| a.id != asset_id);
            found |= release.assets.len() != before;
        }

        if found {
            Ok(())
        } else {
            Err(PublishError::remote("delete release asset", "404 Not Found"))
        }
    }

    async fn upload_release_asset(
        &self,
        owner: &str,
        repo: &str,
        release_id: u64,
        file_path: &Path,
        file_name: &str,
    ) -> Result<Asset> {
        self.log_call(MockCall::UploadAsset {
            owner: owner.to_string(),
            repo: repo.to_string(),
            release_id,
            file_path: file_path.to_path_buf(),
            file_name: file_name.to_string(),
        });

        // Yield once so sibling uploads interleave like real requests
        tokio::task::yield_now().await;

        let parked = self
            .config
            .lock()
            .unwrap()
            .parked_uploads
            .iter()
            .any(|name| name == file_name);
        if parked {
            std::future::pending::<()>().await;
        }

        let mut config = self.config.lock().unwrap();
        if let Some((_, body)) = config.upload_errors.iter().find(|(name, _)| name == file_name) {
            return Err(PublishError::remote("upload asset", body.clone()));
        }

        let name = config
            .uploaded_name_override
            .clone()
            .unwrap_or_else(|| sanitize_name(file_name));
        let next_id = config
            .releases
            .iter()
            .flat_map(|r| r.assets.iter().map(|a| a.id))
            .max()
            .unwrap_or(0)
            + 1;

        let release = config
            .releases
            .iter_mut()
            .find(|r| r.id == release_id)
            .ok_or_else(|| PublishError::remote("upload asset", "release does not exist"))?;

        if release.asset_named(&name).is_some() {
            return Err(PublishError::remote(
                "upload asset",
                format!("attachment {name} already exists"),
            ));
        }

        let asset = asset(next_id, &name);
        release.assets.push(asset.clone());
        Ok(asset)
    }
}

/// Build a minimal asset descriptor
pub fn asset(id: u64, name: &str) -> Asset {
    Asset {
        id,
        uuid: format!("uuid-{id}"),
        name: name.to_string(),
        download_url: format!("https://gitea.example.com/attachments/uuid-{id}"),
        download_count: 0,
        size: 0,
        created_at: None,
    }
}

/// Builder for creating test Release instances
pub struct ReleaseBuilder {
    release: Release,
}

impl ReleaseBuilder {
    pub fn new(id: u64, tag_name: &str) -> Self {
        Self {
            release: Release {
                id,
                name: tag_name.to_string(),
                url: format!("https://gitea.example.com/api/v1/repos/acme/app/releases/{id}"),
                tag_name: tag_name.to_string(),
                draft: false,
                prerelease: false,
                assets: Vec::new(),
                published_at: None,
            },
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.release.name = name.to_string();
        self
    }

    pub fn draft(mut self, draft: bool) -> Self {
        self.release.draft = draft;
        self
    }

    pub fn prerelease(mut self, prerelease: bool) -> Self {
        self.release.prerelease = prerelease;
        self
    }

    pub fn with_asset(mut self, id: u64, name: &str) -> Self {
        self.release.assets.push(asset(id, name));
        self
    }

    pub fn build(self) -> Release {
        self.release
    }
}
