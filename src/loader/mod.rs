//! Destinations for a finished batch of listings.

pub mod bigquery;
pub mod capture;

use crate::models::Listing;
use async_trait::async_trait;

pub use bigquery::BigQueryLoader;
pub use capture::JsonCapture;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0} is not set")]
    MissingCredentials(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Accepts a whole batch and appends it durably.
///
/// Loaders wait for completion but report only batch-level success.
#[async_trait]
pub trait ListingLoader: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self, listings: &[Listing]) -> Result<(), LoaderError>;
}
