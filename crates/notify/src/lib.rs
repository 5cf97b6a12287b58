//! Appointment notifications: HTML templates, combo tables and the outbound
//! mail channel they are sent through.

pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod template;

#[cfg(feature = "smtp")]
pub mod smtp;

pub use channel::{LogChannel, MailChannel, OutboundMail, RecordingChannel};
pub use config::{NotifyConfig, SmtpConfig};
pub use dispatcher::{NotificationDispatcher, render_combo_table_html, EMPTY_COMBO_TABLE};
pub use error::{NotifyError, NotifyResult};
pub use template::{TemplateName, TemplateStore};

#[cfg(feature = "smtp")]
pub use smtp::SmtpChannel;
