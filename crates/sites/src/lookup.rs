//! Domain record lookups against the TenantSite API

use reqwest::{Client, StatusCode};
use tracing::error;

use tenantsite_shared::DomainRecord;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Record lookup request failed: {0}")]
    Request(String),

    #[error("Record lookup returned status {0}")]
    Status(u16),

    #[error("Invalid record payload: {0}")]
    Decode(String),
}

/// Client for `GET {API_URL}/records/{host}`
#[derive(Clone)]
pub struct RecordLookup {
    client: Client,
    api_url: String,
}

impl RecordLookup {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `Ok(None)` when the API has no record for `host`
    pub async fn find(&self, host: &str) -> Result<Option<DomainRecord>, LookupError> {
        let url = format!("{}/records/{}", self.api_url, host);

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(host = %host, error = %e, "Failed to call record lookup");
            LookupError::Request(e.to_string())
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<DomainRecord>()
                .await
                .map(Some)
                .map_err(|e| {
                    error!(host = %host, error = %e, "Failed to parse record lookup response");
                    LookupError::Decode(e.to_string())
                }),
            status => {
                error!(host = %host, status = status.as_u16(), "Record lookup returned error status");
                Err(LookupError::Status(status.as_u16()))
            }
        }
    }
}
