//! Outbound mail channel abstraction.
//!
//! The dispatcher only ever talks to [`MailChannel`]; the relay client, the
//! log-only channel and the in-memory recorder used by tests are interchangeable.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, NotifyResult};

/// A fully rendered HTML message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMail {
    pub subject: String,
    pub to: String,
    pub html_body: String,
}

#[async_trait]
pub trait MailChannel: Send + Sync {
    /// Deliver one message. Single attempt; no retries.
    async fn send(&self, mail: &OutboundMail) -> NotifyResult<()>;
}

/// Writes messages to the tracing log instead of delivering them.
///
/// Used when no relay credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

#[async_trait]
impl MailChannel for LogChannel {
    async fn send(&self, mail: &OutboundMail) -> NotifyResult<()> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            body_len = mail.html_body.len(),
            "mail not sent (log channel)"
        );
        Ok(())
    }
}

/// In-memory channel that keeps every message it is handed.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<OutboundMail>>,
    fail_with: Option<String>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel that rejects every message with the given reason.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    pub fn sent(&self) -> Vec<OutboundMail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MailChannel for RecordingChannel {
    async fn send(&self, mail: &OutboundMail) -> NotifyResult<()> {
        if let Some(reason) = &self.fail_with {
            return Err(NotifyError::channel(reason.clone()));
        }
        self.sent
            .lock()
            .map_err(|_| NotifyError::channel("recording channel poisoned"))?
            .push(mail.clone());
        Ok(())
    }
}

