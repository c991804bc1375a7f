//! Publisher configuration
//!
//! Loaded from a YAML file and/or assembled by the host. Optional flags keep
//! the difference between "unset" and an explicit value, since `draft`
//! defaults to true and `prerelease` to false.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PublishError, Result};
use crate::types::RepositoryRef;

/// Environment variable consulted when no token is configured
pub const TOKEN_ENV_VAR: &str = "GITEA_TOKEN";

const DEFAULT_TAG_PREFIX: &str = "v";

/// Connection and behavior settings for one publish run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Repository to publish into
    #[serde(default)]
    pub repository: Option<RepositoryRef>,

    /// Base URL of the Gitea instance (e.g. `https://gitea.example.com`)
    #[serde(default, alias = "baseUrl")]
    pub base_url: Option<String>,

    /// API token allowed to create releases and upload assets
    #[serde(default, alias = "authToken", skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub prerelease: Option<bool>,

    #[serde(default)]
    pub draft: Option<bool>,

    /// Prepended to the version to form the tag name (default "v")
    #[serde(default, alias = "tagPrefix")]
    pub tag_prefix: Option<String>,

    /// Replace an existing asset with the same name
    #[serde(default)]
    pub force: Option<bool>,
}

impl PublisherConfig {
    pub fn new(repository: RepositoryRef, base_url: impl Into<String>) -> Self {
        Self {
            repository: Some(repository),
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Load a config from a YAML file
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PublishError::io(path, e))?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Check repository identity and base URL.
    ///
    /// Runs before any client is built, so a failure here means no request
    /// was sent.
    pub fn validate(&self) -> Result<&RepositoryRef> {
        let repository = self
            .repository
            .as_ref()
            .filter(|repo| repo.is_complete())
            .ok_or_else(|| {
                PublishError::config(
                    "In order to publish to Gitea, you must set the \"repository.owner\" and \"repository.name\" properties",
                )
            })?;

        if self.base_url.as_deref().map_or(true, |url| url.trim().is_empty()) {
            return Err(PublishError::config(
                "In order to publish to Gitea, you must set the \"base_url\" property",
            ));
        }

        Ok(repository)
    }

    /// Tag name for a version: `{tag_prefix}{version}`
    pub fn tag_name(&self, version: &str) -> String {
        let prefix = self.tag_prefix.as_deref().unwrap_or(DEFAULT_TAG_PREFIX);
        format!("{prefix}{version}")
    }

    /// New releases are drafts unless `draft: false` was set explicitly
    pub fn draft(&self) -> bool {
        self.draft != Some(false)
    }

    pub fn prerelease(&self) -> bool {
        self.prerelease == Some(true)
    }

    pub fn force(&self) -> bool {
        self.force == Some(true)
    }
}

/// Pick the configured token, falling back to `env_token`.
///
/// Blank values count as absent.
pub fn resolve_auth_token(configured: Option<String>, env_token: Option<String>) -> Option<String> {
    configured
        .filter(|token| !token.trim().is_empty())
        .or_else(|| env_token.filter(|token| !token.trim().is_empty()))
}

/// Read the fallback token from the process environment
pub fn token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV_VAR).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PublisherConfig {
        PublisherConfig::new(RepositoryRef::new("acme", "app"), "https://gitea.example.com")
    }

    #[test]
    fn test_tag_name_default_prefix() {
        assert_eq!(config().tag_name("1.2.3"), "v1.2.3");
    }

    #[test]
    fn test_tag_name_custom_prefix() {
        let config = PublisherConfig {
            tag_prefix: Some("rel-".to_string()),
            ..config()
        };
        assert_eq!(config.tag_name("1.2.3"), "rel-1.2.3");
    }

    #[test]
    fn test_tag_name_empty_prefix() {
        let config = PublisherConfig {
            tag_prefix: Some(String::new()),
            ..config()
        };
        assert_eq!(config.tag_name("1.2.3"), "1.2.3");
    }

    #[test]
    fn test_draft_defaults_to_true() {
        assert!(config().draft());
        assert!(PublisherConfig { draft: Some(true), ..config() }.draft());
        assert!(!PublisherConfig { draft: Some(false), ..config() }.draft());
    }

    #[test]
    fn test_prerelease_defaults_to_false() {
        assert!(!config().prerelease());
        assert!(!PublisherConfig { prerelease: Some(false), ..config() }.prerelease());
        assert!(PublisherConfig { prerelease: Some(true), ..config() }.prerelease());
    }

    #[test]
    fn test_force_defaults_to_false() {
        assert!(!config().force());
        assert!(PublisherConfig { force: Some(true), ..config() }.force());
    }

    #[test]
    fn test_validate_ok() {
        let config = config();
        let repo = config.validate().unwrap();
        assert_eq!(repo.to_string(), "acme/app");
    }

    #[test]
    fn test_validate_missing_repository() {
        let config = PublisherConfig {
            repository: None,
            ..config()
        };
        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_validate_missing_owner_or_name() {
        for repo in [RepositoryRef::new("", "app"), RepositoryRef::new("acme", "  ")] {
            let config = PublisherConfig {
                repository: Some(repo),
                ..config()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("repository.owner"));
        }
    }

    #[test]
    fn test_validate_missing_base_url() {
        for base_url in [None, Some(String::new())] {
            let config = PublisherConfig { base_url, ..config() };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("base_url"));
        }
    }

    #[test]
    fn test_resolve_auth_token() {
        assert_eq!(
            resolve_auth_token(Some("abc".into()), Some("env".into())),
            Some("abc".to_string())
        );
        assert_eq!(
            resolve_auth_token(None, Some("env".into())),
            Some("env".to_string())
        );
        assert_eq!(
            resolve_auth_token(Some(String::new()), Some("env".into())),
            Some("env".to_string())
        );
        assert_eq!(resolve_auth_token(None, Some(" ".into())), None);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
repository:
  owner: acme
  name: app
baseUrl: https://gitea.example.com/
tag_prefix: rel-
draft: false
force: true
"#;
        let config: PublisherConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.repository, Some(RepositoryRef::new("acme", "app")));
        assert_eq!(config.base_url.as_deref(), Some("https://gitea.example.com/"));
        assert!(config.auth_token.is_none());
        assert!(!config.draft());
        assert!(!config.prerelease());
        assert!(config.force());
        assert_eq!(config.tag_name("0.9.0"), "rel-0.9.0");
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gitea.yaml");
        tokio::fs::write(
            &path,
            "repository:\n  owner: acme\n  name: app\nbase_url: https://gitea.example.com\nprerelease: true\n",
        )
        .await
        .unwrap();

        let config = PublisherConfig::load(&path).await.unwrap();
        assert!(config.prerelease());
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = PublisherConfig::load(Path::new("/nonexistent/gitea.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Io { .. }));
    }
}
