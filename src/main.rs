use std::sync::Arc;

use anyhow::Result;
use wafud::{AppConfig, AppState, RetryingTransport, SmtpMailer, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    telemetry::init(&config.logging)?;

    tracing::info!(
        version = wafud::VERSION,
        smtp_host = %config.smtp.host,
        "Starting inquiry service"
    );

    let mailer =
        RetryingTransport::from_config(SmtpMailer::from_config(&config.smtp)?, &config.smtp);
    let state = AppState {
        mailer: Arc::new(mailer),
        operator_address: config.smtp.operator_address.clone(),
        brand: config.email.brand_name.clone(),
        timezone: config.email.timezone()?,
    };

    web::run(&config.server, state).await
}
