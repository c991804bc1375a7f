//! Core types for gitea-publisher

pub mod artifact;
pub mod release;

use serde::{Deserialize, Serialize};

pub use artifact::{load_manifest, ArtifactGroup, ArtifactGroups, MakeResult};
pub use release::{Asset, CreateReleaseOptions, Release, ReleaseLookup};

/// Target repository on the forge (owner is a user or organization)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepositoryRef {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.owner.trim().is_empty() && !self.name.trim().is_empty()
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_owner_or_name_is_incomplete() {
        assert!(RepositoryRef::new("acme", "app").is_complete());
        assert!(!RepositoryRef::new("  ", "app").is_complete());
        assert!(!RepositoryRef::new("acme", "\t").is_complete());
        assert_eq!(RepositoryRef::new("acme", "app").to_string(), "acme/app");
    }
}
