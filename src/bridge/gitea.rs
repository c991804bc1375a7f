//! Gitea release API client
//!
//! Implements `ReleaseClient` against the Gitea/Forgejo REST API v1.
//! See: https://gitea.com/api/swagger

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::path::Path;

use crate::config::TOKEN_ENV_VAR;
use crate::error::{PublishError, Result};
use crate::types::{Asset, CreateReleaseOptions, Release};

use super::mime::content_type_for;
use super::release_client::ReleaseClient;

/// Gitea client bound to one instance and one token
pub struct GiteaClient {
    client: Client,
    base_url: String,
    auth_header: HeaderValue,
}

impl GiteaClient {
    /// Create a client for the instance at `base_url`.
    ///
    /// The token must already be resolved (see `config::resolve_auth_token`).
    pub fn new(auth_token: Option<String>, base_url: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gitea-publisher/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http_client(client, auth_token, base_url)
    }

    /// Create a client reusing a preconfigured `reqwest::Client`
    pub fn with_http_client(
        client: Client,
        auth_token: Option<String>,
        base_url: Option<&str>,
    ) -> Result<Self> {
        let auth_token = auth_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                PublishError::config(format!(
                    "No Gitea authentication token provided. Set one in the publisher config or via the {TOKEN_ENV_VAR} environment variable."
                ))
            })?;

        // Gitea uses the "token" scheme instead of "Bearer"
        let mut auth_header = HeaderValue::from_str(&format!("token {auth_token}"))
            .map_err(|e| PublishError::config(format!("Invalid Gitea token: {e}")))?;
        auth_header.set_sensitive(true);

        let base_url = base_url.filter(|url| !url.trim().is_empty()).ok_or_else(|| {
            PublishError::config("No Gitea base URL provided. Set one in the publisher config.")
        })?;

        // Only one trailing slash is dropped
        let base_url = base_url.strip_suffix('/').unwrap_or(base_url).to_string();

        Ok(Self {
            client,
            base_url,
            auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/api/v1/repos/{}/{}",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        )
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.auth_header.clone());
        headers
    }

    /// Error carrying the response status line, e.g. "404 Not Found"
    fn status_error(operation: &str, response: &Response) -> PublishError {
        PublishError::remote(operation, response.status().to_string())
    }
}

#[async_trait]
impl ReleaseClient for GiteaClient {
    async fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let url = format!("{}/releases", self.repo_url(owner, repo));
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error("list releases", &response));
        }

        Ok(response.json().await?)
    }

    async fn create_release(
        &self,
        owner: &str,
        repo: &str,
        options: &CreateReleaseOptions,
    ) -> Result<Release> {
        let url = format!("{}/releases", self.repo_url(owner, repo));
        tracing::debug!("POST {} (tag {})", url, options.tag_name);

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .json(options)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error("create release", &response));
        }

        Ok(response.json().await?)
    }

    async fn delete_release_asset(&self, owner: &str, repo: &str, asset_id: u64) -> Result<()> {
        let url = format!("{}/releases/assets/{}", self.repo_url(owner, repo), asset_id);
        tracing::debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .headers(self.auth_headers())
            .send()
            .await?;

        // Gitea returns 204 No Content on success
        if !response.status().is_success() {
            return Err(Self::status_error("delete release asset", &response));
        }

        Ok(())
    }

    async fn upload_release_asset(
        &self,
        owner: &str,
        repo: &str,
        release_id: u64,
        file_path: &Path,
        file_name: &str,
    ) -> Result<Asset> {
        let url = format!("{}/releases/{}/assets", self.repo_url(owner, repo), release_id);

        let content = tokio::fs::read(file_path)
            .await
            .map_err(|e| PublishError::io(file_path, e))?;
        let content_type = content_type_for(file_path);
        tracing::debug!(
            "POST {} ({}, {} bytes, {})",
            url,
            file_name,
            content.len(),
            content_type
        );

        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("attachment", part);

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::remote("upload asset", body));
        }

        Ok(response.json().await?)
    }
}
