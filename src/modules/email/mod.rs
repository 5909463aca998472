//! Transactional email
//!
//! Report notifications go through the `EmailSender` seam. `ResendClient`
//! talks to the Resend HTTP API; `LogOnlyEmailSender` is used when no API key
//! is configured.

mod resend_client;

pub use resend_client::ResendClient;

use async_trait::async_trait;

use crate::core::error::AppError;

/// A rendered email ready to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// What happened to a message handed to an `EmailSender`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the provider, with its message id when returned
    Accepted(Option<String>),
    /// Nothing was sent (no provider configured)
    Logged,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, AppError>;
}

/// Sender used when email delivery is not configured
#[derive(Debug, Default, Clone)]
pub struct LogOnlyEmailSender;

#[async_trait]
impl EmailSender for LogOnlyEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, AppError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email delivery not configured, message logged only"
        );
        Ok(Delivery::Logged)
    }
}
