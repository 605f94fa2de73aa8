use async_trait::async_trait;
use serde_json::json;
use std::env;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Email service errors
#[derive(Debug, Error)]
pub enum EmailError {
    /// Transport-level error talking to the mail API
    #[error("Email transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The mail API accepted the connection but rejected the message
    #[error("Mail API rejected the message: {0}")]
    Delivery(String),

    /// Configuration error
    #[error("Email configuration error: {0}")]
    Config(String),
}

/// Trait for outbound email delivery
#[async_trait]
pub trait EmailServiceTrait: Send + Sync {
    /// Send the account verification email containing the verification link
    async fn send_verification_email(
        &self,
        recipient: &str,
        nickname: &str,
        verification_url: &str,
    ) -> Result<(), EmailError>;
}

/// Email service backed by an HTTP mail API.
/// Posts a JSON message to the endpoint configured via MAIL_API_URL.
pub struct HttpEmailService {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
    from: String,
}

impl HttpEmailService {
    /// Create a new HTTP email service
    pub fn new(api_url: String, api_token: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_token,
            from,
        }
    }
}

#[async_trait]
impl EmailServiceTrait for HttpEmailService {
    async fn send_verification_email(
        &self,
        recipient: &str,
        nickname: &str,
        verification_url: &str,
    ) -> Result<(), EmailError> {
        let body = json!({
            "from": self.from,
            "to": recipient,
            "subject": "Verify your UserHub account",
            "text": format!(
                "Hello {},\n\nWelcome to UserHub. Please confirm your email address \
                 by opening the link below:\n\n{}\n\nIf you did not create this \
                 account you can ignore this message.\n",
                nickname, verification_url
            ),
        });

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!("Mail API returned {} for verification email: {}", status, detail);
            return Err(EmailError::Delivery(format!("{}: {}", status, detail)));
        }

        info!("Verification email sent to {}", recipient);
        Ok(())
    }
}

/// Fallback email service used when no mail API is configured.
/// Logs the verification link instead of delivering it, which keeps
/// local development and tests working without external services.
pub struct LoggingEmailService;

#[async_trait]
impl EmailServiceTrait for LoggingEmailService {
    async fn send_verification_email(
        &self,
        recipient: &str,
        _nickname: &str,
        verification_url: &str,
    ) -> Result<(), EmailError> {
        info!(
            "MAIL_API_URL not configured; verification link for {}: {}",
            recipient, verification_url
        );
        Ok(())
    }
}

/// Create the email service configured by the environment.
/// Uses the HTTP mail API when MAIL_API_URL is set, the logging
/// fallback otherwise.
pub fn create_email_service_from_env() -> Arc<dyn EmailServiceTrait> {
    match env::var("MAIL_API_URL") {
        Ok(api_url) if !api_url.is_empty() => {
            let api_token = env::var("MAIL_API_TOKEN").ok();
            let from = env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@userhub.example".to_string());

            info!("Using HTTP mail API at {}", api_url);
            Arc::new(HttpEmailService::new(api_url, api_token, from))
        }
        _ => Arc::new(LoggingEmailService),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_service_always_succeeds() {
        let service = LoggingEmailService;
        let result = service
            .send_verification_email(
                "john.doe@example.com",
                "john_doe_123",
                "http://localhost:3000/verify-email/abc/def",
            )
            .await;
        assert!(result.is_ok());
    }
}
