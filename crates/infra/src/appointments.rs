//! Appointment book.
//!
//! Slots on the same date may not overlap. Booking against a combo consumes
//! one use of it in the same transaction as the insert.

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use combotrack_appointments::{Appointment, DATE_FORMAT, NewAppointment, TIME_FORMAT, TimeSlot};
use combotrack_core::{AppointmentId, ComboId, CustomerId, DomainError};

use crate::db;
use crate::error::{StoreError, StoreResult};
use crate::ledger;

const COLUMNS: &str = "id, customer_id, service, date, start_time, end_time, combo_id";

/// SQLite-backed appointment book.
#[derive(Debug, Clone)]
pub struct SqliteAppointmentBook {
    pool: SqlitePool,
}

impl SqliteAppointmentBook {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Book a slot. Fails with `SlotTaken` on overlap, or `Exhausted` if the
    /// paying combo has no uses left; either way nothing is written.
    #[tracing::instrument(skip(self, booking), fields(customer_id = %booking.customer_id, slot = %booking.slot))]
    pub async fn book(&self, booking: &NewAppointment) -> StoreResult<AppointmentId> {
        let mut tx = db::begin_write(&self.pool).await?;

        let same_day = list_by_date_on(&mut tx, &booking.slot, None).await?;
        NewAppointment::ensure_free(&booking.slot, &same_day)?;

        if let Some(combo_id) = booking.combo_id {
            ledger::consume_use_on(&mut tx, combo_id).await?;
        }

        let done = sqlx::query(
            "INSERT INTO appointments (customer_id, service, date, start_time, end_time, combo_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(booking.customer_id.get())
        .bind(&booking.service)
        .bind(booking.slot.date().format(DATE_FORMAT).to_string())
        .bind(booking.slot.start().format(TIME_FORMAT).to_string())
        .bind(booking.slot.end().format(TIME_FORMAT).to_string())
        .bind(booking.combo_id.map(ComboId::get))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let id = AppointmentId::new(done.last_insert_rowid());
        tracing::debug!(%id, "appointment booked");
        Ok(id)
    }

    pub async fn get(&self, id: AppointmentId) -> StoreResult<Appointment> {
        let sql = format!("SELECT {COLUMNS} FROM appointments WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => appointment_from_row(&row),
            None => Err(DomainError::not_found(format!("appointment {id}")).into()),
        }
    }

    /// A customer's appointments, by date then start time.
    pub async fn list_for_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<Appointment>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM appointments WHERE customer_id = ?1 ORDER BY date, start_time"
        );
        let rows = sqlx::query(&sql)
            .bind(customer_id.get())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(appointment_from_row).collect()
    }

    /// Appointments on one date, by start time.
    pub async fn list_by_date(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let sql = format!("SELECT {COLUMNS} FROM appointments WHERE date = ?1 ORDER BY start_time");
        let rows = sqlx::query(&sql)
            .bind(date.format(DATE_FORMAT).to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(appointment_from_row).collect()
    }

    /// Move an appointment to a new slot, subject to the same overlap rule.
    #[tracing::instrument(skip(self, slot), fields(slot = %slot))]
    pub async fn reschedule(&self, id: AppointmentId, slot: TimeSlot) -> StoreResult<()> {
        let mut tx = db::begin_write(&self.pool).await?;

        let same_day = list_by_date_on(&mut tx, &slot, Some(id)).await?;
        NewAppointment::ensure_free(&slot, &same_day)?;

        let done = sqlx::query(
            "UPDATE appointments SET date = ?1, start_time = ?2, end_time = ?3 WHERE id = ?4",
        )
        .bind(slot.date().format(DATE_FORMAT).to_string())
        .bind(slot.start().format(TIME_FORMAT).to_string())
        .bind(slot.end().format(TIME_FORMAT).to_string())
        .bind(id.get())
        .execute(&mut *tx)
        .await?;

        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("appointment {id}")).into());
        }

        tx.commit().await?;
        tracing::debug!("appointment rescheduled");
        Ok(())
    }

    /// Delete an appointment. A combo use spent on it is not given back.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: AppointmentId) -> StoreResult<()> {
        let done = sqlx::query("DELETE FROM appointments WHERE id = ?1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("appointment {id}")).into());
        }
        tracing::debug!("appointment cancelled");
        Ok(())
    }
}

/// Appointments sharing the slot's date, optionally leaving one out.
async fn list_by_date_on(
    conn: &mut SqliteConnection,
    slot: &TimeSlot,
    excluding: Option<AppointmentId>,
) -> StoreResult<Vec<Appointment>> {
    let sql = format!("SELECT {COLUMNS} FROM appointments WHERE date = ?1 AND id != ?2");
    let rows = sqlx::query(&sql)
        .bind(slot.date().format(DATE_FORMAT).to_string())
        .bind(excluding.map(AppointmentId::get).unwrap_or(0))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(appointment_from_row).collect()
}

fn appointment_from_row(row: &SqliteRow) -> StoreResult<Appointment> {
    let id = AppointmentId::new(row.try_get("id")?);
    let date: String = row.try_get("date")?;
    let start: String = row.try_get("start_time")?;
    let end: String = row.try_get("end_time")?;
    let slot = TimeSlot::parse(&date, &start, &end)
        .map_err(|e| StoreError::Corrupt(format!("appointment {id}: {e}")))?;

    Ok(Appointment {
        id,
        customer_id: CustomerId::new(row.try_get("customer_id")?),
        service: row.try_get("service")?,
        slot,
        combo_id: row.try_get::<Option<i64>, _>("combo_id")?.map(ComboId::new),
    })
}
