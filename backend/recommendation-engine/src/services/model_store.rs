use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CATEGORY_MODEL_FILE: &str = "category_model.json";
pub const INTERACTION_MODEL_FILE: &str = "interaction_model.json";

/// Durable storage for trained model blobs.
///
/// Each blob is overwritten wholesale: written to a sibling temp file, then
/// renamed over the previous one.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save<M: Serialize>(&self, name: &str, model: &M) -> Result<()> {
        let bytes = serde_json::to_vec(model)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = self.dir.join(name);
        let staging = self.dir.join(format!(".{}.tmp", name));
        tokio::fs::write(&staging, &bytes).await?;
        tokio::fs::rename(&staging, &target).await?;

        debug!(path = %target.display(), bytes = bytes.len(), "Model blob written");
        Ok(())
    }

    /// Load a blob; `None` when it has never been written.
    pub async fn load<M: DeserializeOwned>(&self, name: &str) -> Result<Option<M>> {
        let path = self.dir.join(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let model = serde_json::from_slice(&bytes)?;
        info!(path = %path.display(), "Model blob loaded");
        Ok(Some(model))
    }
}
