//! Remote photo retrieval for report rendering

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::core::error::AppError;

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download the raw bytes behind `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AppError>;
}

/// Fetches photos over HTTP(S) with a per-request timeout
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("CondoReports/1.0 (maintenance-report-renderer)")
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Image request failed for {}: {}", url, e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Image request for {} returned {}",
                url,
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to read image body {}: {}", url, e))
        })?;

        Ok(bytes.to_vec())
    }
}
