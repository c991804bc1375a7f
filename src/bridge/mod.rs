pub mod gitea;
pub mod mime;
pub mod release_client;

#[cfg(any(test, feature = "test-support"))]
pub mod mock_release_client;

// Re-export mock for downstream test suites
#[cfg(any(test, feature = "test-support"))]
pub use mock_release_client::{MockCall, MockConfig, MockReleaseClient, ReleaseBuilder};

pub use gitea::GiteaClient;
pub use mime::content_type_for;
pub use release_client::{sanitize_name, ReleaseClient};
