//! Service boundary used by the presentation layer.
//!
//! Every typed failure from the stores and the dispatcher is logged here,
//! once, and turned into `bool` / `Option` / empty list. Nothing below this
//! layer logs a failure as final.

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::SqlitePool;

use combotrack_appointments::{Appointment, DATE_FORMAT, NewAppointment, TimeSlot};
use combotrack_combos::{ComboStatus, ComboType, NewComboType};
use combotrack_core::{AppointmentId, ComboId, ComboTypeId, CustomerId, DomainError};
use combotrack_customers::{CustomerDetails, CustomerProfile};
use combotrack_infra::{
    SqliteAppointmentBook, SqliteComboLedger, SqliteCustomerDirectory, StoreError, StoreResult,
};
use combotrack_notify::{MailChannel, NotificationDispatcher, NotifyConfig, NotifyError};

/// Failures the boundary knows how to report.
trait Reported: std::fmt::Display {
    fn kind(&self) -> &'static str;
    /// Business-rule rejections are expected; everything else is an operational fault.
    fn is_business(&self) -> bool;
}

impl Reported for StoreError {
    fn kind(&self) -> &'static str {
        StoreError::kind(self)
    }

    fn is_business(&self) -> bool {
        self.as_domain().is_some()
    }
}

impl Reported for NotifyError {
    fn kind(&self) -> &'static str {
        NotifyError::kind(self)
    }

    fn is_business(&self) -> bool {
        matches!(self, NotifyError::Store(e) if e.as_domain().is_some())
    }
}

fn report<T, E: Reported>(operation: &'static str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) if err.is_business() => {
            tracing::warn!(operation, kind = err.kind(), error = %err, "operation rejected");
            None
        }
        Err(err) => {
            tracing::error!(operation, kind = err.kind(), error = %err, "operation failed");
            None
        }
    }
}

fn parse_date(raw: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| DomainError::validation(format!("invalid date '{raw}': {e}")).into())
}

/// The combo tracker: catalog, customers, appointments and notifications over one pool.
pub struct ComboTrack {
    ledger: SqliteComboLedger,
    directory: SqliteCustomerDirectory,
    book: SqliteAppointmentBook,
    dispatcher: NotificationDispatcher,
}

impl ComboTrack {
    /// Wire the stores over a pool whose schema is already applied.
    pub fn new(pool: SqlitePool, notify: &NotifyConfig, channel: Arc<dyn MailChannel>) -> Self {
        let ledger = SqliteComboLedger::new(pool.clone());
        Self {
            dispatcher: NotificationDispatcher::new(ledger.clone(), notify, channel),
            directory: SqliteCustomerDirectory::new(pool.clone()),
            book: SqliteAppointmentBook::new(pool),
            ledger,
        }
    }

    // ---- combo catalog & ledger ----

    pub async fn create_combo_type(&self, name: &str, services: &str, total_uses: i64) -> Option<ComboTypeId> {
        let result: StoreResult<_> = async {
            let combo_type = NewComboType::new(name, services, total_uses)?;
            self.ledger.create_combo_type(&combo_type).await
        }
        .await;
        report("create_combo_type", result)
    }

    pub async fn list_combo_types(&self) -> Vec<ComboType> {
        report("list_combo_types", self.ledger.list_combo_types().await).unwrap_or_default()
    }

    pub async fn delete_combo_type(&self, id: ComboTypeId) -> bool {
        report("delete_combo_type", self.ledger.delete_combo_type(id).await).is_some()
    }

    /// Sell another combo to an existing customer.
    pub async fn assign_combo(&self, customer_id: CustomerId, combo_type_id: ComboTypeId) -> Option<ComboId> {
        report("assign_combo", self.ledger.assign_combo(customer_id, combo_type_id).await)
    }

    pub async fn active_combos(&self, customer_id: CustomerId) -> Vec<ComboStatus> {
        report("list_active_combos", self.ledger.list_active_combos(customer_id).await).unwrap_or_default()
    }

    /// Record one use of a combo outside of a booking.
    pub async fn use_combo(&self, combo_id: ComboId) -> bool {
        report("consume_use", self.ledger.consume_use(combo_id).await).is_some()
    }

    pub async fn combo_status(&self, combo_id: ComboId) -> Option<ComboStatus> {
        report("get_status", self.ledger.get_status(combo_id).await)
    }

    // ---- customers ----

    pub async fn create_customer(&self, name: &str, phone: &str, combo_type_id: ComboTypeId) -> Option<CustomerId> {
        let result: StoreResult<_> = async {
            let details = CustomerDetails::new(name, phone)?;
            self.directory.create_customer(&details, combo_type_id).await
        }
        .await;
        report("create_customer", result)
    }

    pub async fn customer_by_phone(&self, phone: &str) -> Option<CustomerProfile> {
        report("get_by_phone", self.directory.get_by_phone(phone).await)
    }

    pub async fn customer(&self, id: CustomerId) -> Option<CustomerProfile> {
        report("get_by_id", self.directory.get_by_id(id).await)
    }

    pub async fn list_customers(&self) -> Vec<CustomerProfile> {
        report("list_all", self.directory.list_all().await).unwrap_or_default()
    }

    pub async fn update_customer(&self, id: CustomerId, name: &str, phone: &str) -> bool {
        let result: StoreResult<_> = async {
            let details = CustomerDetails::new(name, phone)?;
            self.directory.update_customer(id, &details).await
        }
        .await;
        report("update_customer", result).is_some()
    }

    pub async fn delete_customer(&self, id: CustomerId) -> bool {
        report("delete_customer", self.directory.delete_customer(id).await).is_some()
    }

    /// Remove the customer if none of their combos has uses left.
    pub async fn prune_if_exhausted(&self, id: CustomerId) -> bool {
        report("prune_if_exhausted", self.directory.prune_if_exhausted(id).await).unwrap_or(false)
    }

    // ---- appointments ----

    /// Book `service` on `date` (`YYYY-MM-DD`) from `start` to `end` (`HH:MM`).
    pub async fn book_appointment(
        &self,
        customer_id: CustomerId,
        service: &str,
        date: &str,
        start: &str,
        end: &str,
        combo_id: Option<ComboId>,
    ) -> Option<AppointmentId> {
        let result: StoreResult<_> = async {
            let slot = TimeSlot::parse(date, start, end)?;
            let booking = NewAppointment::new(customer_id, service, slot, combo_id)?;
            self.book.book(&booking).await
        }
        .await;
        report("book", result)
    }

    pub async fn appointment(&self, id: AppointmentId) -> Option<Appointment> {
        report("get_appointment", self.book.get(id).await)
    }

    pub async fn appointments_for_customer(&self, customer_id: CustomerId) -> Vec<Appointment> {
        report("list_for_customer", self.book.list_for_customer(customer_id).await).unwrap_or_default()
    }

    pub async fn appointments_on(&self, date: &str) -> Vec<Appointment> {
        let result: StoreResult<_> = async { self.book.list_by_date(parse_date(date)?).await }.await;
        report("list_by_date", result).unwrap_or_default()
    }

    pub async fn reschedule_appointment(&self, id: AppointmentId, date: &str, start: &str, end: &str) -> bool {
        let result: StoreResult<_> = async {
            let slot = TimeSlot::parse(date, start, end)?;
            self.book.reschedule(id, slot).await
        }
        .await;
        report("reschedule", result).is_some()
    }

    /// Delete the appointment. A combo use it consumed is not given back.
    pub async fn cancel_appointment(&self, id: AppointmentId) -> bool {
        report("cancel", self.book.cancel(id).await).is_some()
    }

    // ---- notifications ----

    pub async fn combo_table_html(&self, customer_id: CustomerId) -> Option<String> {
        report("render_combo_table", self.dispatcher.render_combo_table(customer_id).await)
    }

    pub async fn send_appointment_confirmation(
        &self,
        customer_id: CustomerId,
        customer_name: &str,
        email: &str,
        service: &str,
        date: &str,
        booked_combo_id: Option<ComboId>,
    ) -> bool {
        let result = self
            .dispatcher
            .send_appointment_confirmation(customer_id, customer_name, email, service, date, booked_combo_id)
            .await;
        report("send_appointment_confirmation", result).is_some()
    }

    pub async fn send_appointment_cancellation(
        &self,
        customer_id: CustomerId,
        customer_name: &str,
        email: &str,
        service: &str,
        date: &str,
    ) -> bool {
        let result = self
            .dispatcher
            .send_appointment_cancellation(customer_id, customer_name, email, service, date)
            .await;
        report("send_appointment_cancellation", result).is_some()
    }

    /// Confirm a stored appointment to `email`, addressing the customer by their record.
    pub async fn confirm_appointment(&self, id: AppointmentId, email: &str) -> bool {
        let result: Result<(), NotifyError> = async {
            let appointment = self.book.get(id).await?;
            let profile = self.directory.get_by_id(appointment.customer_id).await?;
            self.dispatcher
                .send_appointment_confirmation(
                    appointment.customer_id,
                    &profile.customer.name,
                    email,
                    &appointment.service,
                    &appointment.slot.date().format(DATE_FORMAT).to_string(),
                    appointment.combo_id,
                )
                .await
        }
        .await;
        report("confirm_appointment", result).is_some()
    }

    /// Cancel a stored appointment and tell the customer.
    ///
    /// Returns false if the appointment could not be cancelled; a mail failure
    /// after a successful cancel is logged and still returns true.
    pub async fn cancel_and_notify(&self, id: AppointmentId, email: &str) -> bool {
        let Some(appointment) = self.appointment(id).await else {
            return false;
        };
        if !self.cancel_appointment(id).await {
            return false;
        }

        let name = match self.customer(appointment.customer_id).await {
            Some(profile) => profile.customer.name,
            None => return true,
        };
        self.send_appointment_cancellation(
            appointment.customer_id,
            &name,
            email,
            &appointment.service,
            &appointment.slot.date().format(DATE_FORMAT).to_string(),
        )
        .await;
        true
    }
}
