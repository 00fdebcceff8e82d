//! Handing finished artifacts to their destination.

use std::path::PathBuf;

use async_trait::async_trait;
use storyreel_common::StoryResult;
use storyreel_model::Artifact;

/// Destination for a finished artifact.
#[async_trait]
pub trait ArtifactDelivery: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver the artifact, returning where it ended up.
    async fn deliver(&self, artifact: &Artifact) -> StoryResult<PathBuf>;
}

/// Writes artifacts into a directory as `storyboard-<millis>.<ext>`.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactDelivery for DirectoryDelivery {
    fn name(&self) -> &str {
        "directory"
    }

    async fn deliver(&self, artifact: &Artifact) -> StoryResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(artifact.suggested_filename());
        tokio::fs::write(&path, &artifact.bytes).await?;
        tracing::info!(
            path = %path.display(),
            bytes = artifact.len(),
            media_type = %artifact.media_type,
            "Artifact written"
        );
        Ok(path)
    }
}
