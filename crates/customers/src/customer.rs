use serde::{Deserialize, Serialize};

use combotrack_combos::ComboStatus;
use combotrack_core::{CustomerId, DomainError, DomainResult};

/// Validated name and phone, used for both registration and updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    name: String,
    phone: String,
}

impl CustomerDetails {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        let phone = phone.into().trim().to_string();

        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if phone.is_empty() {
            return Err(DomainError::validation("phone cannot be empty"));
        }

        Ok(Self { name, phone })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Phone number, the customer's business key.
    pub fn phone(&self) -> &str {
        &self.phone
    }
}

/// Stored customer identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
}

/// A customer together with the combos that still have uses left.
///
/// The combo list is derived at read time and never stored on the customer row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer: Customer,
    pub combos: Vec<ComboStatus>,
}

impl CustomerProfile {
    /// Build a profile, keeping only active combos.
    pub fn new(customer: Customer, combos: Vec<ComboStatus>) -> Self {
        Self {
            customer,
            combos: combos.into_iter().filter(ComboStatus::is_active).collect(),
        }
    }
}
