//! Streaming inserts into the BigQuery listings table.
//!
//! Uses the `tabledata.insertAll` REST endpoint with a bearer access token
//! (for example from `gcloud auth print-access-token`). The table itself is
//! provisioned outside this tool.

use crate::loader::{ListingLoader, LoaderError};
use crate::models::Listing;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Rows per insertAll request
const MAX_ROWS_PER_REQUEST: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BigQuerySettings {
    pub project_id: String,
    pub dataset: String,
    pub table: String,
    pub access_token: Option<String>,
    pub endpoint: String,
}

impl BigQuerySettings {
    /// Fully qualified `project.dataset.table`
    pub fn table_id(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset, self.table)
    }
}

#[derive(Serialize)]
struct InsertAllRequest<'a> {
    rows: Vec<InsertRow<'a>>,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    json: &'a Listing,
}

pub struct BigQueryLoader {
    client: Client,
    settings: BigQuerySettings,
    token: String,
}

impl BigQueryLoader {
    pub fn new(settings: BigQuerySettings) -> Result<Self, LoaderError> {
        let token = settings
            .access_token
            .clone()
            .ok_or(LoaderError::MissingCredentials("BQ_ACCESS_TOKEN"))?;

        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            settings,
            token,
        })
    }

    fn insert_url(&self) -> String {
        format!(
            "{}/projects/{}/datasets/{}/tables/{}/insertAll",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.project_id,
            self.settings.dataset,
            self.settings.table
        )
    }
}

#[async_trait]
impl ListingLoader for BigQueryLoader {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    async fn load(&self, listings: &[Listing]) -> Result<(), LoaderError> {
        if listings.is_empty() {
            debug!("No listings to insert");
            return Ok(());
        }

        let url = self.insert_url();

        for chunk in listings.chunks(MAX_ROWS_PER_REQUEST) {
            let body = InsertAllRequest {
                rows: chunk.iter().map(|json| InsertRow { json }).collect(),
            };

            let resp = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let message = resp.text().await.unwrap_or_default();
                return Err(LoaderError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            debug!(rows = chunk.len(), "Inserted chunk");
        }

        info!(
            table = %self.settings.table_id(),
            rows = listings.len(),
            "Inserted listings into BigQuery"
        );
        Ok(())
    }
}
