//! Customer directory domain module.
//!
//! This crate contains the rules for customer records and their derived list
//! of active combos, implemented purely as deterministic domain logic.

pub mod customer;

pub use customer::{Customer, CustomerDetails, CustomerProfile};
