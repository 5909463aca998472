use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Delivery, EmailMessage, EmailSender};
use crate::core::config::EmailConfig;
use crate::core::error::AppError;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

/// Resend HTTP API client
pub struct ResendClient {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl ResendClient {
    pub fn new(api_key: String, config: &EmailConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, AppError> {
        let body = SendEmailRequest {
            from: &self.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Resend request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Email request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalServiceError(format!(
                "Email provider returned {}: {}",
                status, text
            )));
        }

        let parsed: SendEmailResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to parse email response: {}", e))
        })?;

        tracing::info!(to = %message.to, id = ?parsed.id, "Email sent");
        Ok(Delivery::Accepted(parsed.id))
    }
}
