//! Notification delivery for alerts

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::config::SmtpConfig;
use crate::models::NotificationPayload;

/// Outbound channel for rendered notifications
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Deliver `payload` to its recipient
    async fn send(&self, payload: &NotificationPayload) -> Result<(), NotificationError>;

    /// Whether payloads should reference an inline logo
    fn inline_logo(&self) -> bool {
        false
    }
}

/// Sends notifications as HTML mail over SMTP
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    logo_path: Option<PathBuf>,
}

impl SmtpNotifier {
    /// Build a notifier from SMTP configuration.
    ///
    /// No connection is made until the first send.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, NotificationError> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotificationError::Smtp(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout()))
            .build();

        let sender = config
            .sender
            .parse()
            .map_err(|e| NotificationError::Address(format!("sender {}: {e}", config.sender)))?;

        debug!(host = %config.host, port = config.port, "SMTP notifier configured");

        Ok(Self {
            transport,
            sender,
            logo_path: config.logo_path.as_ref().map(PathBuf::from),
        })
    }

    async fn build_message(
        &self,
        payload: &NotificationPayload,
    ) -> Result<Message, NotificationError> {
        let recipient: Mailbox = payload.recipient.parse().map_err(|e| {
            NotificationError::Address(format!("recipient {}: {e}", payload.recipient))
        })?;

        let html = SinglePart::html(payload.html_body.clone());
        let body = match &self.logo_path {
            Some(path) => {
                let logo = tokio::fs::read(path).await.map_err(|e| {
                    NotificationError::Attachment(format!("{}: {e}", path.display()))
                })?;
                let logo = Attachment::new_inline("logo".to_string()).body(logo, image_type(path)?);
                MultiPart::related().singlepart(html).singlepart(logo)
            }
            None => MultiPart::related().singlepart(html),
        };

        Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(payload.subject.clone())
            .multipart(body)
            .map_err(|e| NotificationError::Build(e.to_string()))
    }
}

#[async_trait]
impl NotificationTransport for SmtpNotifier {
    async fn send(&self, payload: &NotificationPayload) -> Result<(), NotificationError> {
        let message = self.build_message(payload).await?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Smtp(e.to_string()))?;

        info!(recipient = %payload.recipient, subject = %payload.subject, "Alert mail sent");
        Ok(())
    }

    fn inline_logo(&self) -> bool {
        self.logo_path.is_some()
    }
}

fn image_type(path: &Path) -> Result<ContentType, NotificationError> {
    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "image/png",
    };

    ContentType::parse(mime).map_err(|e| NotificationError::Attachment(e.to_string()))
}

/// Notification errors
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Sender or recipient did not parse as a mailbox
    #[error("Invalid address: {0}")]
    Address(String),

    /// Message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(String),

    /// SMTP relay rejected or dropped the message
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// Logo could not be read or typed
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Send exceeded its time budget
    #[error("Send timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            username: "alerts".to_string(),
            password: "secret".to_string(),
            sender: "AutoInven <alerts@example.com>".to_string(),
            recipient: "owner@example.com".to_string(),
            ..SmtpConfig::default()
        }
    }

    fn payload() -> NotificationPayload {
        crate::alerting::render::render(
            &crate::models::AlertCondition::pending_bills(),
            &[crate::models::AlertRecord::PendingBill {
                institution_name: "ISP".to_string(),
                description: "Monthly line".to_string(),
                amount: 45.0,
            }],
            "owner@example.com",
            false,
        )
    }

    #[test]
    fn test_image_type_from_extension() {
        let png = ContentType::parse("image/png").unwrap();
        let jpeg = ContentType::parse("image/jpeg").unwrap();

        assert_eq!(image_type(Path::new("logo.PNG")).unwrap(), png);
        assert_eq!(image_type(Path::new("logo.jpeg")).unwrap(), jpeg);
        assert_eq!(image_type(Path::new("logo")).unwrap(), png);
    }

    #[test]
    fn test_rejects_bad_sender() {
        let mut config = smtp_config();
        config.sender = "nope".to_string();

        assert!(matches!(
            SmtpNotifier::from_config(&config),
            Err(NotificationError::Address(_))
        ));
    }

    #[tokio::test]
    async fn test_builds_html_message() {
        let notifier = SmtpNotifier::from_config(&smtp_config()).unwrap();
        assert!(!notifier.inline_logo());

        let message = notifier.build_message(&payload()).await.unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: owner@example.com"));
        assert!(raw.contains("multipart/related"));
        assert!(raw.contains("text/html"));
    }

    #[tokio::test]
    async fn test_missing_logo_is_attachment_error() {
        let mut config = smtp_config();
        config.logo_path = Some("/nonexistent/autoinven-logo.png".to_string());
        let notifier = SmtpNotifier::from_config(&config).unwrap();
        assert!(notifier.inline_logo());

        let err = notifier.build_message(&payload()).await.unwrap_err();
        assert!(matches!(err, NotificationError::Attachment(_)));
    }

    #[tokio::test]
    async fn test_logo_is_attached_inline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let mut config = smtp_config();
        config.logo_path = Some(path.display().to_string());
        let notifier = SmtpNotifier::from_config(&config).unwrap();

        let message = notifier.build_message(&payload()).await.unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Content-ID: <logo>"));
        assert!(raw.contains("image/png"));
    }
}
