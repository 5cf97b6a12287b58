//! Process configuration, read from `COMBOTRACK_*` environment variables.

use std::path::PathBuf;
use std::sync::Arc;

use combotrack_notify::{LogChannel, MailChannel, NotifyConfig, NotifyResult, SmtpConfig};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://database/business.db";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub notify: NotifyConfig,
    /// `None` when relay credentials are incomplete; mail then goes to the log.
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("COMBOTRACK_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let defaults = NotifyConfig::default();
        let notify = NotifyConfig {
            template_dir: get("COMBOTRACK_TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_dir),
            business_name: get("COMBOTRACK_BUSINESS_NAME").unwrap_or(defaults.business_name),
        };

        let port = match get("COMBOTRACK_SMTP_PORT") {
            None => DEFAULT_SMTP_PORT,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "COMBOTRACK_SMTP_PORT is not a port number; using {DEFAULT_SMTP_PORT}");
                DEFAULT_SMTP_PORT
            }),
        };

        let smtp = match (
            get("COMBOTRACK_SMTP_HOST"),
            get("COMBOTRACK_SMTP_USER"),
            get("COMBOTRACK_SMTP_PASSWORD"),
        ) {
            (Some(host), Some(username), Some(password)) => {
                let from = get("COMBOTRACK_MAIL_FROM").unwrap_or_else(|| username.clone());
                Some(SmtpConfig {
                    host,
                    port,
                    username,
                    password,
                    from,
                })
            }
            _ => None,
        };

        Self {
            database_url,
            notify,
            smtp,
        }
    }

    /// Filesystem location of the database, if the URL names a file.
    pub fn database_path(&self) -> Option<PathBuf> {
        let path = self
            .database_url
            .strip_prefix("sqlite://")
            .or_else(|| self.database_url.strip_prefix("sqlite:"))?;
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() || path.starts_with(":memory:") {
            return None;
        }
        Some(PathBuf::from(path))
    }

    /// The channel outgoing mail is handed to.
    ///
    /// Without complete relay credentials (or without the `smtp` feature) this
    /// is the log channel.
    pub fn mail_channel(&self) -> NotifyResult<Arc<dyn MailChannel>> {
        match &self.smtp {
            #[cfg(feature = "smtp")]
            Some(smtp) => Ok(Arc::new(combotrack_notify::SmtpChannel::new(smtp)?)),
            #[cfg(not(feature = "smtp"))]
            Some(smtp) => {
                tracing::warn!(host = %smtp.host, "smtp feature not enabled; mail will only be logged");
                Ok(Arc::new(LogChannel))
            }
            None => {
                tracing::warn!("SMTP credentials not set; mail will only be logged");
                Ok(Arc::new(LogChannel))
            }
        }
    }
}
