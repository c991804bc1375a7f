//! gitea-publisher - Publish build artifacts to Gitea releases
//!
//! Groups build outputs by version, finds or creates the release tagged for
//! each version, and uploads every artifact as a release asset.

pub mod bridge;
pub mod config;
pub mod error;
pub mod publish;
pub mod types;

// Re-exports for convenience
pub use bridge::{sanitize_name, GiteaClient, ReleaseClient};
pub use config::PublisherConfig;
pub use error::{PublishError, Result};
pub use publish::{GroupReport, PublishReport, Publisher, StatusLine};
pub use types::*;
