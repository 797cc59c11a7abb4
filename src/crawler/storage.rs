use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log2::trace;
use tokio::fs;
use url::Url;

const MAX_FILENAME_LEN: usize = 200;

/// Where fetched pages end up.
#[async_trait]
pub trait ContentStorage: Send + Sync {
    async fn save(&self, url: &Url, content: &str, depth: usize) -> Result<()>;
}

pub type ContentStorageRef = Arc<dyn ContentStorage>;

/// Filesystem safe name for a page: `://` becomes `_`, anything outside
/// `[a-zA-Z0-9.-]` becomes `_`, capped at 200 characters.
pub fn to_filename(url: &Url) -> String {
    let name: String = url
        .as_str()
        .replace("://", "_")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .take(MAX_FILENAME_LEN)
        .collect();

    if name.is_empty() {
        "index".to_string()
    } else {
        name
    }
}

/// Saves pages as `<root>/<depth>/<filename>.html`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn page_path(&self, url: &Url, depth: usize) -> PathBuf {
        self.root
            .join(depth.to_string())
            .join(format!("{}.html", to_filename(url)))
    }
}

#[async_trait]
impl ContentStorage for LocalFileStorage {
    async fn save(&self, url: &Url, content: &str, depth: usize) -> Result<()> {
        let depth_dir = self.root.join(depth.to_string());
        fs::create_dir_all(&depth_dir)
            .await
            .with_context(|| format!("Failed to create {}", depth_dir.display()))?;

        let path = self.page_path(url, depth);
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to save content for {} to {}", url, path.display()))?;

        trace!("Saved {} to {}", url, path.display());
        Ok(())
    }
}
