//! Integration tests for the publish flow
//!
//! Drives `Publisher` through the public API against an in-memory forge that
//! reads the artifact files from a temporary directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use gitea_publisher::{
    Asset, CreateReleaseOptions, MakeResult, PublishError, Publisher, PublisherConfig, Release,
    ReleaseClient, RepositoryRef, Result, StatusLine,
};

/// In-memory forge keeping releases and a log of operation names
#[derive(Default)]
struct InMemoryForge {
    releases: Mutex<Vec<Release>>,
    log: Mutex<Vec<String>>,
}

impl InMemoryForge {
    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn release_by_tag(&self, tag_name: &str) -> Option<Release> {
        self.releases
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.tag_name == tag_name)
            .cloned()
    }
}

#[async_trait]
impl ReleaseClient for InMemoryForge {
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        self.log.lock().unwrap().push(format!("list {owner}/{repo}"));
        Ok(self.releases.lock().unwrap().clone())
    }

    async fn create_release(
        &self,
        _owner: &str,
        _repo: &str,
        options: &CreateReleaseOptions,
    ) -> Result<Release> {
        self.log.lock().unwrap().push(format!("create {}", options.tag_name));
        let mut releases = self.releases.lock().unwrap();
        let release = Release {
            id: releases.len() as u64 + 100,
            name: options.name.clone(),
            url: String::new(),
            tag_name: options.tag_name.clone(),
            draft: options.draft,
            prerelease: options.prerelease,
            assets: Vec::new(),
            published_at: None,
        };
        releases.push(release.clone());
        Ok(release)
    }

    async fn delete_release_asset(&self, _owner: &str, _repo: &str, asset_id: u64) -> Result<()> {
        self.log.lock().unwrap().push(format!("delete {asset_id}"));
        for release in self.releases.lock().unwrap().iter_mut() {
            release.assets.retain(|a| a.id != asset_id);
        }
        Ok(())
    }

    async fn upload_release_asset(
        &self,
        _owner: &str,
        _repo: &str,
        release_id: u64,
        file_path: &Path,
        file_name: &str,
    ) -> Result<Asset> {
        let content = tokio::fs::read(file_path)
            .await
            .map_err(|e| PublishError::io(file_path, e))?;

        self.log.lock().unwrap().push(format!("upload {file_name}"));
        let asset = Asset {
            id: 1000 + content.len() as u64,
            uuid: String::new(),
            name: gitea_publisher::sanitize_name(file_name),
            download_url: format!("https://gitea.example.com/attachments/{file_name}"),
            download_count: 0,
            size: content.len() as u64,
            created_at: None,
        };

        let mut releases = self.releases.lock().unwrap();
        let release = releases
            .iter_mut()
            .find(|r| r.id == release_id)
            .ok_or_else(|| PublishError::remote("upload asset", "404 Not Found"))?;
        release.assets.push(asset.clone());
        Ok(asset)
    }
}

struct Harness {
    dir: TempDir,
    forge: Arc<InMemoryForge>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            forge: Arc::new(InMemoryForge::default()),
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn artifact(&self, name: &str, size: usize) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, vec![b'x'; size]).unwrap();
        path
    }

    fn status(&self) -> Arc<dyn StatusLine> {
        let lines = Arc::clone(&self.lines);
        Arc::new(move |line: &str| lines.lock().unwrap().push(line.to_string()))
    }

    fn publisher(&self, config: PublisherConfig) -> Publisher {
        Publisher::new(config, self.forge.clone())
    }
}

fn config() -> PublisherConfig {
    PublisherConfig::new(RepositoryRef::new("acme", "desktop"), "https://gitea.example.com/")
}

#[tokio::test]
async fn test_two_make_results_share_one_release() {
    let harness = Harness::new();
    let exe = harness.artifact("Desktop Setup 2.0.0.exe", 10);
    let nupkg = harness.artifact("desktop-2.0.0-full.nupkg", 20);

    let report = harness
        .publisher(config())
        .publish(
            &[
                MakeResult::new("2.0.0", vec![exe]),
                MakeResult::new("2.0.0", vec![nupkg]),
            ],
            harness.status(),
        )
        .await
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.total_uploaded(), 2);

    let release = harness.forge.release_by_tag("v2.0.0").unwrap();
    assert!(release.draft);
    assert!(!release.prerelease);
    let names: Vec<&str> = release.assets.iter().map(|a| a.name.as_str()).collect();
    assert!(names.contains(&"Desktop-Setup-2.0.0.exe"));
    assert!(names.contains(&"desktop-2.0.0-full.nupkg"));

    let lines = harness.lines.lock().unwrap();
    assert_eq!(lines.first().unwrap(), "Searching for release v2.0.0");
    assert_eq!(lines.last().unwrap(), "Uploading distributable (2/2 to v2.0.0)");
}

#[tokio::test]
async fn test_republish_with_force_replaces_assets() {
    let harness = Harness::new();
    let first = harness.artifact("app-1.0.0.zip", 5);

    harness
        .publisher(config())
        .publish(&[MakeResult::new("1.0.0", vec![first.clone()])], harness.status())
        .await
        .unwrap();

    std::fs::write(&first, vec![b'y'; 8]).unwrap();
    let forced = PublisherConfig {
        force: Some(true),
        ..config()
    };
    harness
        .publisher(forced)
        .publish(&[MakeResult::new("1.0.0", vec![first])], harness.status())
        .await
        .unwrap();

    let log = harness.forge.log();
    assert_eq!(log.iter().filter(|l| l.starts_with("create")).count(), 1);
    assert_eq!(log.iter().filter(|l| l.starts_with("delete")).count(), 1);
    assert_eq!(log.last().unwrap(), "upload app-1.0.0.zip");

    let release = harness.forge.release_by_tag("v1.0.0").unwrap();
    assert_eq!(release.assets.len(), 1);
    assert_eq!(release.assets[0].size, 8);
}

#[tokio::test]
async fn test_missing_artifact_fails_the_version() {
    let harness = Harness::new();
    let missing = harness.dir.path().join("not-built.dmg");

    let err = harness
        .publisher(config())
        .publish(&[MakeResult::new("3.0.0", vec![missing])], harness.status())
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Io { .. }));
    assert!(err.to_string().contains("not-built.dmg"));
}

#[tokio::test]
async fn test_progress_counts_never_interleave() {
    let harness = Harness::new();
    let artifacts: Vec<PathBuf> = (0..24)
        .map(|i| harness.artifact(&format!("part-{i}.bin"), i + 1))
        .collect();

    harness
        .publisher(config())
        .publish(&[MakeResult::new("4.0.0", artifacts)], harness.status())
        .await
        .unwrap();

    let lines = harness.lines.lock().unwrap();
    let expected: Vec<String> = (0..=24)
        .map(|n| format!("Uploading distributable ({n}/24 to v4.0.0)"))
        .collect();
    assert_eq!(lines[1..], expected[..]);
}

#[tokio::test]
async fn test_invalid_config_touches_nothing() {
    let harness = Harness::new();
    let artifact = harness.artifact("app.exe", 1);
    let config = PublisherConfig {
        repository: Some(RepositoryRef::new("acme", "")),
        ..config()
    };

    let err = harness
        .publisher(config)
        .publish(&[MakeResult::new("1.0.0", vec![artifact])], harness.status())
        .await
        .unwrap_err();

    assert!(err.is_config());
    assert!(harness.forge.log().is_empty());
    assert!(harness.lines.lock().unwrap().is_empty());
}
