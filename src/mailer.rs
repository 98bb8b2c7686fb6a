use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use tokio::task;

use crate::{AppError, Result, config::SmtpConfig};

/// What the transport needs to deliver one notification
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    /// Customer address, so the operator can answer straight from the inbox
    pub reply_to: Option<String>,
}

/// Delivers rendered emails. Built once at startup and shared by all requests.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<()>;
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    from: String,
}

impl SmtpMailer {
    /// The SMTP socket timeout is set to `timeout_seconds`, which bounds a
    /// blocking send even after its caller has given up on it.
    pub fn from_config(config: &SmtpConfig) -> anyhow::Result<Self> {
        let builder = if config.starttls {
            SmtpTransport::starttls_relay(&config.host)
        } else {
            SmtpTransport::relay(&config.host)
        }
        .with_context(|| format!("Invalid SMTP host {}", config.host))?
        .port(config.port)
        .timeout(Some(config.timeout()));

        let builder = if config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
        };

        let sender = if config.username.is_empty() {
            &config.operator_address
        } else {
            &config.username
        };

        Ok(Self {
            transport: builder.build(),
            from: format!("\"{}\" <{}>", config.from_name, sender),
        })
    }

    fn build_message(&self, email: &OutboundEmail) -> anyhow::Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.parse().context("Failed to parse from address")?)
            .to(email.to.parse().context("Failed to parse to address")?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML);

        if let Some(reply_to) = &email.reply_to {
            match reply_to.parse() {
                Ok(mailbox) => builder = builder.reply_to(mailbox),
                Err(e) => tracing::warn!("Ignoring unparsable reply-to address: {e}"),
            }
        }

        builder
            .body(email.html.clone())
            .context("Failed to build message")
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    #[tracing::instrument(name = "smtp_send", skip_all, fields(subject = %email.subject))]
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        let message = self
            .build_message(&email)
            .map_err(|e| AppError::delivery(format!("{e:#}")))?;

        let transport = self.transport.clone();
        task::spawn_blocking(move || transport.send(&message))
            .await
            .context("SMTP delivery task failed")
            .and_then(|sent| sent.context("SMTP server rejected the message"))
            .map_err(|e| AppError::delivery(format!("{e:#}")))?;

        tracing::info!("Delivered email to {}", email.to);
        Ok(())
    }
}

/// Bounds each delivery attempt by a timeout and retries failed attempts.
///
/// An attempt that times out is not retried. Its send may still be running
/// and could deliver, so a retry would risk a duplicate notification.
pub struct RetryingTransport<T> {
    inner: T,
    timeout: Duration,
    max_retries: u32,
}

impl<T: MailTransport> RetryingTransport<T> {
    pub fn new(inner: T, timeout: Duration, max_retries: u32) -> Self {
        Self {
            inner,
            timeout,
            max_retries,
        }
    }

    pub fn from_config(inner: T, config: &SmtpConfig) -> Self {
        Self::new(inner, config.timeout(), config.max_retries)
    }
}

#[async_trait]
impl<T: MailTransport> MailTransport for RetryingTransport<T> {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        let mut attempt = 0;
        loop {
            match tokio::time::timeout(self.timeout, self.inner.send(email.clone())).await {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, "Email delivery failed, retrying: {e}");
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(AppError::delivery(format!(
                        "Delivery timed out after {:?}",
                        self.timeout
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn mailer() -> SmtpMailer {
        let config = SmtpConfig {
            username: "mailer@wafud.example".to_string(),
            password: "app-password".to_string(),
            operator_address: "bookings@wafud.example".to_string(),
            ..SmtpConfig::default()
        };
        SmtpMailer::from_config(&config).unwrap()
    }

    fn email() -> OutboundEmail {
        OutboundEmail {
            to: "bookings@wafud.example".to_string(),
            subject: "Contact Form: Feedback".to_string(),
            html: "<p>hello</p>".to_string(),
            reply_to: Some("Ali <ali@x.com>".to_string()),
        }
    }

    #[test]
    fn test_from_header_uses_display_name() {
        assert_eq!(mailer().from, "\"Wafud Al Haram\" <mailer@wafud.example>");
    }

    #[test]
    fn test_retry_policy_from_config() {
        let retrying = RetryingTransport::from_config(mailer(), &SmtpConfig::default());
        assert_eq!(retrying.timeout, Duration::from_secs(10));
        assert_eq!(retrying.max_retries, 1);
    }

    /// Fails the first `failures` attempts, then delivers
    struct FlakyTransport {
        failures: usize,
        attempts: AtomicUsize,
    }

    impl FlakyTransport {
        fn failing(failures: usize) -> Self {
            Self {
                failures,
                attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MailTransport for FlakyTransport {
        async fn send(&self, _email: OutboundEmail) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                Err(AppError::delivery("421 service not available"))
            } else {
                Ok(())
            }
        }
    }

    struct HangingTransport {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl MailTransport for HangingTransport {
        async fn send(&self, _email: OutboundEmail) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    fn retrying<T: MailTransport>(inner: T) -> RetryingTransport<T> {
        RetryingTransport::new(inner, Duration::from_millis(200), 1)
    }

    #[tokio::test]
    async fn test_single_failure_is_retried() {
        let transport = retrying(FlakyTransport::failing(1));
        assert!(transport.send(email()).await.is_ok());
        assert_eq!(transport.inner.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_one_retry() {
        let transport = retrying(FlakyTransport::failing(usize::MAX));
        let err = transport.send(email()).await.unwrap_err();
        assert!(matches!(err, AppError::Delivery { .. }));
        assert_eq!(transport.inner.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timed_out_attempt_is_not_retried() {
        let transport = RetryingTransport::new(
            HangingTransport {
                attempts: AtomicUsize::new(0),
            },
            Duration::from_millis(50),
            1,
        );
        let err = transport.send(email()).await.unwrap_err();
        assert!(matches!(err, AppError::Delivery { ref message } if message.contains("timed out")));
        assert_eq!(transport.inner.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_build_message_is_html_with_reply_to() {
        let message = mailer().build_message(&email()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("Reply-To: Ali <ali@x.com>"));
        assert!(raw.contains("Subject: Contact Form: Feedback"));
    }

    #[test]
    fn test_bad_recipient_is_rejected() {
        let email = OutboundEmail {
            to: "not an address".to_string(),
            ..email()
        };
        assert!(mailer().build_message(&email).is_err());
    }
}
