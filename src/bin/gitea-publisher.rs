//! gitea-publisher - upload build artifacts to a Gitea release
//!
//! Usage:
//!   gitea-publisher --config gitea.yaml --release-version 1.2.3 dist/app.exe dist/app.dmg
//!   gitea-publisher --owner acme --repo app --base-url https://gitea.example.com --manifest make.json
//!
//! The token comes from `--token`, the config file, or `GITEA_TOKEN`, in that order.

use anyhow::Context;
use clap::Parser;
use gitea_publisher::config::token_from_env;
use gitea_publisher::{load_manifest, MakeResult, Publisher, PublisherConfig, StatusLine};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "gitea-publisher")]
#[command(about = "Upload build artifacts as Gitea release assets", long_about = None)]
struct Args {
    /// YAML publisher config (flags below override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Repository owner (user or organization)
    #[arg(long)]
    owner: Option<String>,

    /// Repository name
    #[arg(long)]
    repo: Option<String>,

    /// Base URL of the Gitea instance
    #[arg(long)]
    base_url: Option<String>,

    /// API token (falls back to the config file, then GITEA_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Prefix for the release tag (default "v")
    #[arg(long)]
    tag_prefix: Option<String>,

    /// Create new releases as drafts (default true)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    draft: Option<bool>,

    /// Mark new releases as prereleases (`--prerelease=false` overrides the config)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    prerelease: Option<bool>,

    /// Replace existing assets with the same name (`--force=false` overrides the config)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    force: Option<bool>,

    /// JSON file with a list of {"version", "artifacts"} make results
    #[arg(long, conflicts_with_all = ["release_version", "artifacts"])]
    manifest: Option<PathBuf>,

    /// Version of the artifacts given on the command line
    #[arg(long, requires = "artifacts")]
    release_version: Option<String>,

    /// Artifact files to upload
    artifacts: Vec<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of the file config
    fn apply(&self, mut config: PublisherConfig) -> PublisherConfig {
        if self.owner.is_some() || self.repo.is_some() {
            let mut repository = config.repository.take().unwrap_or_default();
            if let Some(owner) = &self.owner {
                repository.owner.clone_from(owner);
            }
            if let Some(repo) = &self.repo {
                repository.name.clone_from(repo);
            }
            config.repository = Some(repository);
        }
        if self.base_url.is_some() {
            config.base_url.clone_from(&self.base_url);
        }
        if self.token.is_some() {
            config.auth_token.clone_from(&self.token);
        }
        if self.tag_prefix.is_some() {
            config.tag_prefix.clone_from(&self.tag_prefix);
        }
        if self.draft.is_some() {
            config.draft = self.draft;
        }
        if self.prerelease.is_some() {
            config.prerelease = self.prerelease;
        }
        if self.force.is_some() {
            config.force = self.force;
        }
        config
    }

    async fn make_results(&self) -> anyhow::Result<Vec<MakeResult>> {
        if let Some(manifest) = &self.manifest {
            return load_manifest(manifest)
                .await
                .with_context(|| format!("Failed to load manifest {}", manifest.display()));
        }

        let version = self
            .release_version
            .clone()
            .context("Either --manifest or --release-version with artifact paths is required")?;
        Ok(vec![MakeResult::new(version, self.artifacts.clone())])
    }
}

/// Renders the status line as a spinner message
struct SpinnerStatus {
    bar: ProgressBar,
}

impl SpinnerStatus {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl StatusLine for SpinnerStatus {
    fn set_status_line(&self, line: &str) {
        self.bar.set_message(line.to_string());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => PublisherConfig::load(path).await?,
        None => PublisherConfig::default(),
    };
    let config = args.apply(file_config);
    let make_results = args.make_results().await?;

    let publisher = Publisher::from_config(config, token_from_env())?;

    let spinner = Arc::new(SpinnerStatus::new());
    let status: Arc<dyn StatusLine> = spinner.clone();
    let outcome = publisher.publish(&make_results, status).await;
    spinner.bar.finish_and_clear();

    let report = outcome?;
    for group in &report.groups {
        let verb = if group.created { "created" } else { "updated" };
        println!(
            "{} ({}): {} asset(s) uploaded",
            group.tag_name,
            verb,
            group.uploaded.len()
        );
        for asset in &group.uploaded {
            println!("  {}", asset.download_url);
        }
    }

    Ok(())
}
