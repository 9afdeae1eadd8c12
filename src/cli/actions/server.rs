use crate::api;
use crate::api::handlers::auth::AuthConfig;
use crate::api::notify::{LogOtpSender, OtpSender, WebhookOtpSender};
use crate::cli::actions::Action;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            otp_webhook_url,
            otp_ttl,
        } => {
            let dsn = Url::parse(&dsn)?;

            if !dsn.scheme().starts_with("postgres") {
                return Err(anyhow!("Unsupported database scheme: {}", dsn.scheme()));
            }

            let sender: Arc<dyn OtpSender> = match otp_webhook_url {
                Some(url) => Arc::new(WebhookOtpSender::new(&url)?),
                None => Arc::new(LogOtpSender),
            };

            let config = AuthConfig::new().with_otp_ttl_seconds(otp_ttl);

            api::new(port, dsn.to_string(), config, sender).await?;
        }
    }

    Ok(())
}
