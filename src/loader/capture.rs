use crate::loader::{ListingLoader, LoaderError};
use crate::models::Listing;
use async_trait::async_trait;
use chrono::Local;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Writes each batch to its own timestamped JSON file
pub struct JsonCapture {
    dir: PathBuf,
    prefix: String,
}

impl JsonCapture {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save the batch as one pretty-printed JSON array and return its path.
    ///
    /// Non-ASCII text (accents, `m²`, `€`) is written as-is. An existing file
    /// is never overwritten: a name already taken gets a `_<n>` suffix.
    pub async fn save(&self, listings: &[Listing]) -> Result<PathBuf, LoaderError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_string_pretty(listings)?;
        let stem = format!(
            "{}_{}",
            self.prefix,
            Local::now().format("%Y%m%d_%H%M%S_%3f")
        );
        let (path, mut file) = self.create_unique(&stem).await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        info!("💾 Saved {} listings to {}", listings.len(), path.display());
        Ok(path)
    }

    async fn create_unique(&self, stem: &str) -> Result<(PathBuf, File), LoaderError> {
        let mut attempt = 0u32;
        loop {
            let filename = match attempt {
                0 => format!("{}.json", stem),
                n => format!("{}_{}.json", stem, n),
            };
            let path = self.dir.join(filename);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Capture file exists, trying next name");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl ListingLoader for JsonCapture {
    fn name(&self) -> &'static str {
        "json-capture"
    }

    async fn load(&self, listings: &[Listing]) -> Result<(), LoaderError> {
        self.save(listings).await.map(|_| ())
    }
}
