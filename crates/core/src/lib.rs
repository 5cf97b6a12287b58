//! `combotrack-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no storage, no mail).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AppointmentId, ComboId, ComboTypeId, CustomerId};
