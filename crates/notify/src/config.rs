//! Notification settings, passed in explicitly by whoever builds the dispatcher.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where templates live and how the business signs its messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub template_dir: PathBuf,
    /// Appended to every subject line, e.g. `Appointment Confirmation - <business_name>`.
    pub business_name: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            business_name: "Ani's Threading & Skincare".to_string(),
        }
    }
}

/// Relay settings for the SMTP channel (STARTTLS + login).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender mailbox, e.g. `Ani's Threading <owner@example.com>`.
    pub from: String,
}

// Keep the password out of logs.
impl core::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}
