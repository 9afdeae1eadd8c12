//! One-time code delivery abstractions.
//!
//! The auth flows hand `(identity, code)` to an [`OtpSender`] and move on;
//! delivery is fire-and-forget with no guarantee. The default sender for
//! local dev logs the code. `WebhookOtpSender` posts it to an HTTP endpoint
//! (a mail relay bridge, a test collector) on a spawned task so request
//! latency never waits on delivery.

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct OtpMessage {
    pub to_email: String,
    pub code: String,
    /// Which flow requested the code ("registration", "reset", "resend").
    pub purpose: &'static str,
}

/// Delivery abstraction for one-time codes.
pub trait OtpSender: Send + Sync {
    /// Hand off a message for delivery or return an error to be logged.
    fn send(&self, message: &OtpMessage) -> Result<()>;
}

/// Local dev sender that logs the code instead of delivering it.
#[derive(Clone, Debug)]
pub struct LogOtpSender;

impl OtpSender for LogOtpSender {
    fn send(&self, message: &OtpMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            code = %message.code,
            purpose = %message.purpose,
            "otp delivery stub"
        );
        Ok(())
    }
}

/// Posts codes to a webhook URL, fire-and-forget.
#[derive(Clone, Debug)]
pub struct WebhookOtpSender {
    client: reqwest::Client,
    url: String,
}

impl WebhookOtpSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl OtpSender for WebhookOtpSender {
    fn send(&self, message: &OtpMessage) -> Result<()> {
        let client = self.client.clone();
        let url = self.url.clone();
        let payload = json!({
            "email": message.to_email,
            "code": message.code,
            "purpose": message.purpose,
        });

        // No delivery guarantee: failures are logged, never retried here.
        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(response) if !response.status().is_success() => {
                    error!(status = %response.status(), "otp webhook rejected delivery");
                }
                Ok(_) => {}
                Err(err) => {
                    error!("otp webhook delivery failed: {err}");
                }
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_sender_accepts_messages() {
        let sender = LogOtpSender;
        let message = OtpMessage {
            to_email: "a@b.com".to_string(),
            code: "123456".to_string(),
            purpose: "registration",
        };
        assert!(sender.send(&message).is_ok());
    }

    #[tokio::test]
    async fn webhook_sender_builds_and_spawns() {
        let sender = WebhookOtpSender::new("http://127.0.0.1:1/otp").expect("client");
        let message = OtpMessage {
            to_email: "a@b.com".to_string(),
            code: "123456".to_string(),
            purpose: "reset",
        };
        // Unreachable endpoint: send still returns Ok, failure is logged.
        assert!(sender.send(&message).is_ok());
    }
}
