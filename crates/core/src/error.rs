//! Domain error model.

use thiserror::Error;

use crate::id::{ComboId, CustomerId};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on business failures (validation, uniqueness, exhausted
/// combos). Storage and transport concerns belong to the crates that own them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty name, zero uses).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A combo type with this name already exists.
    #[error("combo type '{0}' already exists")]
    DuplicateName(String),

    /// A customer with this phone number already exists.
    #[error("customer with phone '{0}' already exists")]
    DuplicatePhone(String),

    /// The combo has no remaining uses (or does not exist).
    #[error("combo {0} has no remaining uses")]
    Exhausted(ComboId),

    /// Deletion blocked because the customer still owns active combos.
    #[error("customer {0} still has active combos")]
    HasActiveCombos(CustomerId),

    /// The initial combo could not be attached to a new customer.
    #[error("combo assignment failed: {0}")]
    ComboAssignmentFailed(String),

    /// The requested appointment slot overlaps an existing booking.
    #[error("time slot is already booked: {0}")]
    SlotTaken(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn assignment_failed(msg: impl Into<String>) -> Self {
        Self::ComboAssignmentFailed(msg.into())
    }

    pub fn slot_taken(msg: impl Into<String>) -> Self {
        Self::SlotTaken(msg.into())
    }

    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation",
            DomainError::NotFound(_) => "not_found",
            DomainError::DuplicateName(_) => "duplicate_name",
            DomainError::DuplicatePhone(_) => "duplicate_phone",
            DomainError::Exhausted(_) => "exhausted",
            DomainError::HasActiveCombos(_) => "has_active_combos",
            DomainError::ComboAssignmentFailed(_) => "combo_assignment_failed",
            DomainError::SlotTaken(_) => "slot_taken",
        }
    }
}
