//! HTML email templates with `{{NAME}}` placeholders.
//!
//! Substitution is an exact literal match and values are inserted as-is
//! (no HTML escaping); callers pass values that are already safe for HTML.

use std::path::PathBuf;

use crate::error::{NotifyError, NotifyResult};

/// The templates the dispatcher knows how to send.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TemplateName {
    AppointmentConfirmation,
    AppointmentCancellation,
}

impl TemplateName {
    pub fn file_name(self) -> &'static str {
        match self {
            TemplateName::AppointmentConfirmation => "appointment_confirmation.html",
            TemplateName::AppointmentCancellation => "appointment_cancellation.html",
        }
    }
}

/// Loads templates from a directory on every call (no caching).
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read the raw template text. Any read failure is reported as `TemplateMissing`.
    pub async fn load(&self, name: TemplateName) -> NotifyResult<String> {
        let path = self.dir.join(name.file_name());
        tokio::fs::read_to_string(&path).await.map_err(|err| {
            tracing::debug!(path = %path.display(), error = %err, "template read failed");
            NotifyError::TemplateMissing(name.file_name().to_string())
        })
    }
}

/// Replace every `{{KEY}}` with its value. Unknown placeholders are left untouched.
pub fn fill_placeholders(template: &str, placeholders: &[(&str, &str)]) -> String {
    placeholders
        .iter()
        .fold(template.to_string(), |body, (key, value)| {
            body.replace(&format!("{{{{{key}}}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_occurrence() {
        let out = fill_placeholders(
            "<p>Hi {{CUSTOMER_NAME}}, see you {{DATE}}. Bye {{CUSTOMER_NAME}}!</p>",
            &[("CUSTOMER_NAME", "Jane"), ("DATE", "2025-01-25")],
        );
        assert_eq!(out, "<p>Hi Jane, see you 2025-01-25. Bye Jane!</p>");
    }

    #[test]
    fn leaves_unknown_placeholders_and_does_not_escape() {
        let out = fill_placeholders(
            "{{COMBO_TABLE}} {{REMAINING_USES}}",
            &[("COMBO_TABLE", "<table><tr><td>x</td></tr></table>")],
        );
        assert_eq!(out, "<table><tr><td>x</td></tr></table> {{REMAINING_USES}}");
    }

    #[tokio::test]
    async fn missing_template_is_reported_by_name() {
        let store = TemplateStore::new("/nonexistent/combotrack/templates");
        let err = store.load(TemplateName::AppointmentCancellation).await.unwrap_err();
        match err {
            NotifyError::TemplateMissing(name) => assert_eq!(name, "appointment_cancellation.html"),
            other => panic!("expected TemplateMissing, got {other:?}"),
        }
    }
}
