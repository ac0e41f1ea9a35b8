//! Artifact descriptors on disk.
//!
//! [`FileArtifactResolver`] turns a `file://` URI (or plain path) into an [`ArtifactSpec`] by
//! reading a JSON descriptor. [`DescriptorScanner`] lists the descriptors of a directory so the
//! daemon can register them at startup.

use anyhow::{Context, Result};
use async_trait::async_trait;
use edgeflow_api::ArtifactSpec;
use log::info;
use std::path::{Path, PathBuf};

const FILE_SCHEME: &str = "file://";

/// Obtains the descriptor of the artifact located at a URI.
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    async fn resolve(&self, uri: &str) -> Result<ArtifactSpec>;
}

/// Reads JSON artifact descriptors from the local file system.
#[derive(Debug, Default, Clone)]
pub struct FileArtifactResolver;

impl FileArtifactResolver {
    pub fn new() -> Self {
        Self
    }

    fn path_of(uri: &str) -> Result<PathBuf> {
        match uri.split_once("://") {
            None => Ok(PathBuf::from(uri)),
            Some(_) if uri.starts_with(FILE_SCHEME) => Ok(PathBuf::from(&uri[FILE_SCHEME.len()..])),
            Some((scheme, _)) => anyhow::bail!("unsupported URI scheme '{}'", scheme),
        }
    }
}

#[async_trait]
impl ArtifactResolver for FileArtifactResolver {
    async fn resolve(&self, uri: &str) -> Result<ArtifactSpec> {
        let path = Self::path_of(uri)?;
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read descriptor {:?}", path))?;
        let mut spec: ArtifactSpec = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse descriptor {:?}", path))?;
        if spec.uri.is_empty() {
            spec.uri = uri.to_string();
        }
        Ok(spec)
    }
}

/// Lists the artifact descriptors (`*.json`) of one directory.
pub struct DescriptorScanner {
    artifacts_dir: PathBuf,
}

impl DescriptorScanner {
    /// Creates a new [`DescriptorScanner`].
    ///
    /// # Arguments
    ///
    /// * `artifacts_dir` - The directory holding one descriptor per artifact.
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
        }
    }

    /// Returns the `file://` URIs of all descriptors, sorted by file name.
    /// Hidden files are ignored.
    pub async fn scan(&self) -> Result<Vec<String>> {
        info!("Registry: Scanning {:?} for artifacts", self.artifacts_dir);
        let mut dir = tokio::fs::read_dir(&self.artifacts_dir)
            .await
            .with_context(|| format!("Failed to open {:?}", self.artifacts_dir))?;

        let mut paths = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.is_file() && is_descriptor(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths
            .iter()
            .map(|p| format!("{}{}", FILE_SCHEME, p.to_string_lossy()))
            .collect())
    }
}

fn is_descriptor(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(true, |n| n.starts_with('.'));
    !hidden && path.extension().and_then(|e| e.to_str()) == Some("json")
}
