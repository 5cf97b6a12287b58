//! SMTP relay channel (STARTTLS + login), enabled with the `smtp` feature.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::channel::{MailChannel, OutboundMail};
use crate::config::SmtpConfig;
use crate::error::{NotifyError, NotifyResult};

pub struct SmtpChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpChannel {
    pub fn new(config: &SmtpConfig) -> NotifyResult<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| NotifyError::channel(format!("invalid sender '{}': {e}", config.from)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::channel(format!("invalid relay '{}': {e}", config.host)))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        tracing::info!(host = %config.host, port = config.port, "smtp channel configured");
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailChannel for SmtpChannel {
    async fn send(&self, mail: &OutboundMail) -> NotifyResult<()> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| NotifyError::channel(format!("invalid recipient '{}': {e}", mail.to)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body.clone())
            .map_err(|e| NotifyError::channel(format!("failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::channel(e.to_string()))?;

        tracing::info!(to = %mail.to, "mail sent");
        Ok(())
    }
}
