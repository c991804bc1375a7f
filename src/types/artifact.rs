//! Build outputs handed over by the packaging host

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PublishError, Result};

/// One build output: a version and the files produced for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeResult {
    pub version: String,
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
}

impl MakeResult {
    pub fn new(version: impl Into<String>, artifacts: Vec<PathBuf>) -> Self {
        Self {
            version: version.into(),
            artifacts,
        }
    }
}

/// Read a JSON manifest: an array of `{"version", "artifacts"}` objects
pub async fn load_manifest(path: &Path) -> Result<Vec<MakeResult>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PublishError::io(path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Artifacts of one version, flattened across make results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactGroup {
    pub version: String,
    pub artifacts: Vec<PathBuf>,
}

/// Artifact paths partitioned by version.
///
/// Groups keep the order in which their version first appeared, and paths
/// keep their order within a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactGroups {
    groups: Vec<ArtifactGroup>,
}

impl ArtifactGroups {
    pub fn from_make_results<'a>(results: impl IntoIterator<Item = &'a MakeResult>) -> Self {
        let mut groups: Vec<ArtifactGroup> = Vec::new();

        for result in results {
            match groups.iter_mut().find(|g| g.version == result.version) {
                Some(group) => group.artifacts.extend(result.artifacts.iter().cloned()),
                None => groups.push(ArtifactGroup {
                    version: result.version.clone(),
                    artifacts: result.artifacts.clone(),
                }),
            }
        }

        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, version: &str) -> Option<&ArtifactGroup> {
        self.groups.iter().find(|g| g.version == version)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtifactGroup> {
        self.groups.iter()
    }
}

impl IntoIterator for ArtifactGroups {
    type Item = ArtifactGroup;
    type IntoIter = std::vec::IntoIter<ArtifactGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
