use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use combotrack_core::{AppointmentId, ComboId, CustomerId, DomainError, DomainResult};

/// Storage/display format for appointment dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage/display format for appointment times. Slots have minute resolution.
pub const TIME_FORMAT: &str = "%H:%M";

/// A bookable interval on one calendar day, half-open: `[start, end)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    /// Both times must fall on a whole minute, and `start` must be before `end`.
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> DomainResult<Self> {
        for time in [start, end] {
            if time.second() != 0 || time.nanosecond() != 0 {
                return Err(DomainError::validation(format!(
                    "time {} must be a whole minute",
                    time.format("%H:%M:%S%.f")
                )));
            }
        }
        if start >= end {
            return Err(DomainError::validation(format!(
                "start time {} must be before end time {}",
                start.format(TIME_FORMAT),
                end.format(TIME_FORMAT)
            )));
        }
        Ok(Self { date, start, end })
    }

    /// Parse `YYYY-MM-DD` and `HH:MM` strings.
    pub fn parse(date: &str, start: &str, end: &str) -> DomainResult<Self> {
        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|e| DomainError::validation(format!("invalid date '{date}': {e}")))?;
        let start = parse_time(start)?;
        let end = parse_time(end)?;
        Self::new(date, start, end)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Two slots overlap when they share a date and their intervals intersect.
    ///
    /// Back-to-back slots (one ends when the next starts) do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.date == other.date && self.start < other.end && other.start < self.end
    }
}

impl core::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.date.format(DATE_FORMAT),
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT)
        )
    }
}

fn parse_time(s: &str) -> DomainResult<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|e| DomainError::validation(format!("invalid time '{s}': {e}")))
}

/// Input for a new booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub customer_id: CustomerId,
    pub service: String,
    pub slot: TimeSlot,
    /// Combo that pays for this appointment, if any.
    pub combo_id: Option<ComboId>,
}

impl NewAppointment {
    pub fn new(
        customer_id: CustomerId,
        service: impl Into<String>,
        slot: TimeSlot,
        combo_id: Option<ComboId>,
    ) -> DomainResult<Self> {
        let service = service.into().trim().to_string();
        if service.is_empty() {
            return Err(DomainError::validation("service cannot be empty"));
        }
        Ok(Self {
            customer_id,
            service,
            slot,
            combo_id,
        })
    }

    /// Reject the booking if any existing appointment already holds an overlapping slot.
    pub fn ensure_free<'a>(
        slot: &TimeSlot,
        existing: impl IntoIterator<Item = &'a Appointment>,
    ) -> DomainResult<()> {
        if let Some(clash) = existing.into_iter().find(|a| a.slot.overlaps(slot)) {
            return Err(DomainError::slot_taken(format!(
                "{slot} overlaps appointment {} ({})",
                clash.id, clash.slot
            )));
        }
        Ok(())
    }
}

/// A booked appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub customer_id: CustomerId,
    pub service: String,
    pub slot: TimeSlot,
    pub combo_id: Option<ComboId>,
}
