//! Appointment book domain module.
//!
//! Time-slot validation and the non-overlap rule for bookings, implemented
//! purely as deterministic domain logic (no IO, no storage).

pub mod appointment;

pub use appointment::{Appointment, NewAppointment, TimeSlot, DATE_FORMAT, TIME_FORMAT};
