use thiserror::Error;

use combotrack_infra::StoreError;

pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The template file could not be read.
    #[error("email template '{0}' not found")]
    TemplateMissing(String),

    /// The mail channel refused or failed to deliver the message.
    #[error("mail channel failure: {0}")]
    ChannelFailure(String),

    /// Combo state could not be read for the message body.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl NotifyError {
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::ChannelFailure(msg.into())
    }

    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyError::TemplateMissing(_) => "template_missing",
            NotifyError::ChannelFailure(_) => "channel_failure",
            NotifyError::Store(e) => e.kind(),
        }
    }
}
