use crate::core::error::RateError;
use crate::core::rates::RateSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetches the daily rate feed published by the Bank of Russia.
pub struct CbrRateSource {
    url: String,
    client: reqwest::Client,
}

impl CbrRateSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cbrate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(CbrRateSource {
            url: url.to_string(),
            client,
        })
    }

    fn network_error(&self, reason: String) -> RateError {
        RateError::Network {
            url: self.url.clone(),
            reason,
        }
    }
}

#[async_trait]
impl RateSource for CbrRateSource {
    #[instrument(name = "CbrRateFetch", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<u8>, RateError> {
        debug!("Requesting rate feed");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.network_error(format!("request error: {e}")))?;

        debug!(status = %response.status(), "Received rate feed response");
        if !response.status().is_success() {
            return Err(self.network_error(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.network_error(format!("failed to read body: {e}")))?;
        Ok(body.to_vec())
    }
}
