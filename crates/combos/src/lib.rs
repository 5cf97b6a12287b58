//! Combo catalog domain module.
//!
//! This crate contains the business rules for combo types and purchased
//! combos, implemented purely as deterministic domain logic (no IO, no storage).

pub mod combo;

pub use combo::{ComboStatus, ComboType, NewComboType};
