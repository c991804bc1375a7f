//! Publish orchestration
//!
//! For every version found in the make results:
//! 1. Look for a release tagged `{tag_prefix}{version}`
//! 2. Create it if missing (draft unless configured otherwise)
//! 3. Upload all artifacts of the version concurrently, replacing
//!    same-named assets when `force` is set
//!
//! Versions are published one after another and the run stops at the first
//! failing version. Within a version the first failed upload aborts the
//! uploads still in flight.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;

use crate::bridge::{sanitize_name, GiteaClient, ReleaseClient};
use crate::config::{resolve_auth_token, PublisherConfig};
use crate::error::{PublishError, Result};
use crate::types::{
    ArtifactGroup, ArtifactGroups, Asset, CreateReleaseOptions, MakeResult, Release,
    ReleaseLookup, RepositoryRef,
};

/// Receives the current one-line status; each call replaces the previous line.
pub trait StatusLine: Send + Sync {
    fn set_status_line(&self, line: &str);
}

impl<F> StatusLine for F
where
    F: Fn(&str) + Send + Sync,
{
    fn set_status_line(&self, line: &str) {
        self(line);
    }
}

/// Outcome of publishing one version
#[derive(Debug, Clone)]
pub struct GroupReport {
    pub version: String,
    pub tag_name: String,
    pub release_id: u64,
    /// Whether the release was created during this run
    pub created: bool,
    /// Uploaded assets, in artifact order
    pub uploaded: Vec<Asset>,
}

#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    pub groups: Vec<GroupReport>,
}

impl PublishReport {
    pub fn total_uploaded(&self) -> usize {
        self.groups.iter().map(|g| g.uploaded.len()).sum()
    }
}

/// Publishes make results as release assets of one repository
pub struct Publisher {
    config: PublisherConfig,
    client: Arc<dyn ReleaseClient>,
}

impl Publisher {
    pub fn new(config: PublisherConfig, client: Arc<dyn ReleaseClient>) -> Self {
        Self { config, client }
    }

    /// Validate `config` and build a Gitea-backed publisher.
    ///
    /// `env_token` is used when the config carries no token.
    pub fn from_config(config: PublisherConfig, env_token: Option<String>) -> Result<Self> {
        config.validate()?;
        let token = resolve_auth_token(config.auth_token.clone(), env_token);
        let client = GiteaClient::new(token, config.base_url.as_deref())?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    pub async fn publish(
        &self,
        make_results: &[MakeResult],
        status: Arc<dyn StatusLine>,
    ) -> Result<PublishReport> {
        let repository = self.config.validate()?.clone();
        let groups = ArtifactGroups::from_make_results(make_results);
        tracing::info!(
            "Publishing {} version(s) to {} at {}",
            groups.len(),
            repository,
            self.config.base_url.as_deref().unwrap_or_default()
        );

        let mut report = PublishReport::default();
        for group in groups {
            let group_report = self.publish_group(&repository, group, &status).await?;
            report.groups.push(group_report);
        }

        Ok(report)
    }

    async fn publish_group(
        &self,
        repository: &RepositoryRef,
        group: ArtifactGroup,
        status: &Arc<dyn StatusLine>,
    ) -> Result<GroupReport> {
        let tag_name = self.config.tag_name(&group.version);

        status.set_status_line(&format!("Searching for release {tag_name}"));
        let (release, created) = self.find_or_create_release(repository, &tag_name).await?;

        let progress = Arc::new(UploadProgress::new(
            Arc::clone(status),
            tag_name.clone(),
            group.artifacts.len(),
        ));
        progress.report();

        let release_id = release.id;
        let release = Arc::new(release);
        let mut join_set = JoinSet::new();

        for (index, path) in group.artifacts.into_iter().enumerate() {
            let upload = AssetUpload {
                client: Arc::clone(&self.client),
                repository: repository.clone(),
                release: Arc::clone(&release),
                path,
                force: self.config.force(),
            };
            let progress = Arc::clone(&progress);

            join_set.spawn(async move {
                let asset = upload.run().await?;
                progress.advance();
                Ok::<_, PublishError>((index, asset))
            });
        }

        let mut uploaded = Vec::with_capacity(join_set.len());
        while let Some(joined) = join_set.join_next().await {
            let outcome = joined
                .map_err(|e| PublishError::TaskJoin(e.to_string()))
                .and_then(|result| result);

            match outcome {
                Ok(entry) => uploaded.push(entry),
                Err(e) => {
                    join_set.abort_all();
                    return Err(e);
                }
            }
        }
        uploaded.sort_by_key(|(index, _)| *index);

        tracing::info!("Published {} asset(s) to {}", uploaded.len(), tag_name);

        Ok(GroupReport {
            version: group.version,
            tag_name,
            release_id,
            created,
            uploaded: uploaded.into_iter().map(|(_, asset)| asset).collect(),
        })
    }

    async fn find_or_create_release(
        &self,
        repository: &RepositoryRef,
        tag_name: &str,
    ) -> Result<(Release, bool)> {
        let lookup = self
            .client
            .find_release(&repository.owner, &repository.name, tag_name)
            .await?;

        match lookup {
            ReleaseLookup::Found(release) => {
                tracing::info!("Found release {} (id {})", tag_name, release.id);
                Ok((release, false))
            }
            ReleaseLookup::NotFound => {
                let options = CreateReleaseOptions {
                    tag_name: tag_name.to_string(),
                    name: tag_name.to_string(),
                    draft: self.config.draft(),
                    prerelease: self.config.prerelease(),
                };
                tracing::info!(
                    "Creating release {} (draft: {}, prerelease: {})",
                    tag_name,
                    options.draft,
                    options.prerelease
                );

                let release = self
                    .client
                    .create_release(&repository.owner, &repository.name, &options)
                    .await?;
                Ok((release, true))
            }
        }
    }
}

/// Upload counter shared by the tasks of one version.
///
/// The count is bumped and reported under one lock so status lines never
/// show interleaved counts.
struct UploadProgress {
    status: Arc<dyn StatusLine>,
    tag_name: String,
    total: usize,
    uploaded: Mutex<usize>,
}

impl UploadProgress {
    fn new(status: Arc<dyn StatusLine>, tag_name: String, total: usize) -> Self {
        Self {
            status,
            tag_name,
            total,
            uploaded: Mutex::new(0),
        }
    }

    fn report(&self) {
        let uploaded = self.uploaded.lock().unwrap_or_else(PoisonError::into_inner);
        self.emit(*uploaded);
    }

    fn advance(&self) {
        let mut uploaded = self.uploaded.lock().unwrap_or_else(PoisonError::into_inner);
        *uploaded += 1;
        self.emit(*uploaded);
    }

    fn emit(&self, uploaded: usize) {
        self.status.set_status_line(&format!(
            "Uploading distributable ({uploaded}/{} to {})",
            self.total, self.tag_name
        ));
    }
}

/// One artifact headed for a release
struct AssetUpload {
    client: Arc<dyn ReleaseClient>,
    repository: RepositoryRef,
    release: Arc<Release>,
    path: PathBuf,
    force: bool,
}

impl AssetUpload {
    async fn run(self) -> Result<Asset> {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PublishError::io(
                    &self.path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "artifact path has no file name"),
                )
            })?;
        let sanitized = sanitize_name(&file_name);
        let (owner, repo) = (&self.repository.owner, &self.repository.name);

        if let Some(existing) = self.release.asset_named(&sanitized) {
            if self.force {
                tracing::info!("Replacing existing asset '{}' (id {})", sanitized, existing.id);
                self.client.delete_release_asset(owner, repo, existing.id).await?;
            } else {
                tracing::warn!(
                    "Asset '{}' already exists on {}; uploading without force",
                    sanitized,
                    self.release.tag_name
                );
            }
        }

        let asset = match self
            .client
            .upload_release_asset(owner, repo, self.release.id, &self.path, &file_name)
            .await
        {
            Ok(asset) => asset,
            Err(e) => {
                tracing::error!("Error uploading asset '{}': {}", file_name, e);
                return Err(e);
            }
        };

        if asset.name != sanitized {
            tracing::warn!(
                "Expected asset name to be '{}' - got '{}'",
                sanitized,
                asset.name
            );
        }

        Ok(asset)
    }
}
