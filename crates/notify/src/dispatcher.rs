//! Appointment notifications.
//!
//! The combo table in every message is rendered from the ledger's live state
//! at send time; the dispatcher keeps no copy of its own.

use std::sync::Arc;

use combotrack_combos::ComboStatus;
use combotrack_core::{ComboId, CustomerId};
use combotrack_infra::SqliteComboLedger;

use crate::channel::{MailChannel, OutboundMail};
use crate::config::NotifyConfig;
use crate::error::NotifyResult;
use crate::template::{TemplateName, TemplateStore, fill_placeholders};

/// Fragment used in place of the table when a customer has no active combos.
pub const EMPTY_COMBO_TABLE: &str = "<p>No active combos.</p>";

/// Render active combos as an HTML table of name and remaining uses.
pub fn render_combo_table_html(combos: &[ComboStatus]) -> String {
    if combos.is_empty() {
        return EMPTY_COMBO_TABLE.to_string();
    }

    let mut html = String::from(
        "<table border=\"1\" cellpadding=\"6\" cellspacing=\"0\">\
         <tr><th>Combo</th><th>Remaining Uses</th></tr>",
    );
    for combo in combos {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            combo.name, combo.remaining_uses
        ));
    }
    html.push_str("</table>");
    html
}

pub struct NotificationDispatcher {
    ledger: SqliteComboLedger,
    templates: TemplateStore,
    channel: Arc<dyn MailChannel>,
    business_name: String,
}

impl NotificationDispatcher {
    pub fn new(ledger: SqliteComboLedger, config: &NotifyConfig, channel: Arc<dyn MailChannel>) -> Self {
        Self {
            ledger,
            templates: TemplateStore::new(config.template_dir.clone()),
            channel,
            business_name: config.business_name.clone(),
        }
    }

    /// The customer's active combos as an HTML fragment.
    pub async fn render_combo_table(&self, customer_id: CustomerId) -> NotifyResult<String> {
        let combos = self.ledger.list_active_combos(customer_id).await?;
        Ok(render_combo_table_html(&combos))
    }

    /// Send the booking confirmation, including the customer's current combo balance.
    ///
    /// `booked_combo_id` is the combo the booking was paid with, if any; its use
    /// has already been consumed by the time this is called.
    #[tracing::instrument(skip(self, customer_name, email, service, date))]
    pub async fn send_appointment_confirmation(
        &self,
        customer_id: CustomerId,
        customer_name: &str,
        email: &str,
        service: &str,
        date: &str,
        booked_combo_id: Option<ComboId>,
    ) -> NotifyResult<()> {
        self.send_templated(
            TemplateName::AppointmentConfirmation,
            "Appointment Confirmation",
            customer_id,
            customer_name,
            email,
            service,
            date,
        )
        .await
    }

    #[tracing::instrument(skip(self, customer_name, email, service, date))]
    pub async fn send_appointment_cancellation(
        &self,
        customer_id: CustomerId,
        customer_name: &str,
        email: &str,
        service: &str,
        date: &str,
    ) -> NotifyResult<()> {
        self.send_templated(
            TemplateName::AppointmentCancellation,
            "Appointment Cancellation",
            customer_id,
            customer_name,
            email,
            service,
            date,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn send_templated(
        &self,
        template: TemplateName,
        subject: &str,
        customer_id: CustomerId,
        customer_name: &str,
        email: &str,
        service: &str,
        date: &str,
    ) -> NotifyResult<()> {
        let raw = self.templates.load(template).await?;
        let combo_table = self.render_combo_table(customer_id).await?;

        let html_body = fill_placeholders(
            &raw,
            &[
                ("CUSTOMER_NAME", customer_name),
                ("SERVICE", service),
                ("DATE", date),
                ("COMBO_TABLE", &combo_table),
            ],
        );

        let mail = OutboundMail {
            subject: format!("{subject} - {}", self.business_name),
            to: email.to_string(),
            html_body,
        };
        self.channel.send(&mail).await?;

        tracing::debug!(template = template.file_name(), "notification handed to channel");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::channel::RecordingChannel;
    use crate::error::NotifyError;
    use combotrack_combos::NewComboType;
    use combotrack_core::ComboTypeId;
    use combotrack_infra::connect_in_memory;

    fn repo_templates() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../templates")
    }

    fn config(template_dir: PathBuf) -> NotifyConfig {
        NotifyConfig {
            template_dir,
            business_name: "Test Salon".to_string(),
        }
    }

    async fn ledger_with_combo(uses: i64) -> (SqliteComboLedger, CustomerId, ComboId) {
        let ledger = SqliteComboLedger::new(connect_in_memory().await.unwrap());
        let type_id = ledger
            .create_combo_type(&NewComboType::new("Threading Combo", "Eyebrow Threading", uses).unwrap())
            .await
            .unwrap();
        let customer_id = CustomerId::new(1);
        let combo_id = ledger.assign_combo(customer_id, type_id).await.unwrap();
        (ledger, customer_id, combo_id)
    }

    fn status(name: &str, remaining: i64) -> ComboStatus {
        ComboStatus {
            id: ComboId::new(1),
            customer_id: CustomerId::new(1),
            combo_type_id: ComboTypeId::new(1),
            name: name.to_string(),
            remaining_uses: remaining,
            total_uses: 5,
        }
    }

    #[test]
    fn empty_combo_list_renders_literal_fragment() {
        assert_eq!(render_combo_table_html(&[]), EMPTY_COMBO_TABLE);
    }

    #[test]
    fn combo_table_lists_name_and_remaining_uses() {
        let html = render_combo_table_html(&[status("Threading Combo", 4)]);
        assert!(html.starts_with("<table"));
        assert!(html.contains("<td>Threading Combo</td><td>4</td>"));
    }

    #[tokio::test]
    async fn render_combo_table_reads_live_state() {
        let (ledger, customer_id, combo_id) = ledger_with_combo(5).await;
        ledger.consume_use(combo_id).await.unwrap();

        let dispatcher = NotificationDispatcher::new(
            ledger,
            &config(repo_templates()),
            Arc::new(RecordingChannel::new()),
        );

        let html = dispatcher.render_combo_table(customer_id).await.unwrap();
        assert!(html.contains("Threading Combo"));
        assert!(html.contains("<td>4</td>"));

        let nobody = dispatcher.render_combo_table(CustomerId::new(2)).await.unwrap();
        assert_eq!(nobody, EMPTY_COMBO_TABLE);
    }

    #[tokio::test]
    async fn confirmation_is_rendered_and_sent_once() {
        let (ledger, customer_id, combo_id) = ledger_with_combo(5).await;
        ledger.consume_use(combo_id).await.unwrap();

        let channel = Arc::new(RecordingChannel::new());
        let dispatcher = NotificationDispatcher::new(ledger, &config(repo_templates()), channel.clone());

        dispatcher
            .send_appointment_confirmation(
                customer_id,
                "Jane Smith",
                "jane@example.com",
                "Eyebrow Threading",
                "2025-01-25",
                Some(combo_id),
            )
            .await
            .unwrap();

        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
        assert_eq!(sent[0].subject, "Appointment Confirmation - Test Salon");
        assert!(sent[0].html_body.contains("Jane Smith"));
        assert!(sent[0].html_body.contains("Eyebrow Threading"));
        assert!(sent[0].html_body.contains("2025-01-25"));
        // Live balance after the booked use, not decremented a second time.
        assert!(sent[0].html_body.contains("<td>Threading Combo</td><td>4</td>"));
        assert!(!sent[0].html_body.contains("{{"));
    }

    #[tokio::test]
    async fn cancellation_uses_its_own_template_and_subject() {
        let (ledger, customer_id, _) = ledger_with_combo(3).await;
        let channel = Arc::new(RecordingChannel::new());
        let dispatcher = NotificationDispatcher::new(ledger, &config(repo_templates()), channel.clone());

        dispatcher
            .send_appointment_cancellation(
                customer_id,
                "Jane Smith",
                "jane@example.com",
                "Facial",
                "2025-01-26",
            )
            .await
            .unwrap();

        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Appointment Cancellation - Test Salon");
        assert!(sent[0].html_body.contains("cancelled"));
        assert!(sent[0].html_body.contains("<td>3</td>"));
    }

    #[tokio::test]
    async fn missing_template_never_reaches_the_channel() {
        let (ledger, customer_id, _) = ledger_with_combo(3).await;
        let channel = Arc::new(RecordingChannel::new());
        let dispatcher = NotificationDispatcher::new(
            ledger,
            &config(PathBuf::from("/nonexistent/combotrack/templates")),
            channel.clone(),
        );

        let err = dispatcher
            .send_appointment_cancellation(customer_id, "Jane", "jane@example.com", "Facial", "2025-01-26")
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::TemplateMissing(_)));
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn channel_failure_is_reported() {
        let (ledger, customer_id, _) = ledger_with_combo(3).await;
        let dispatcher = NotificationDispatcher::new(
            ledger,
            &config(repo_templates()),
            Arc::new(RecordingChannel::failing("relay unreachable")),
        );

        let err = dispatcher
            .send_appointment_confirmation(customer_id, "Jane", "jane@example.com", "Facial", "2025-01-26", None)
            .await
            .unwrap_err();

        match err {
            NotifyError::ChannelFailure(msg) => assert_eq!(msg, "relay unreachable"),
            other => panic!("expected ChannelFailure, got {other:?}"),
        }
    }
}
