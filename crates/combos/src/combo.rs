use serde::{Deserialize, Serialize};

use combotrack_core::{ComboId, ComboTypeId, CustomerId, DomainError, DomainResult};

/// Validated input for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComboType {
    name: String,
    services: String,
    total_uses: i64,
}

impl NewComboType {
    /// Build a catalog entry, trimming the name.
    ///
    /// `total_uses` must be at least one; `services` is free text and may be empty.
    pub fn new(
        name: impl Into<String>,
        services: impl Into<String>,
        total_uses: i64,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("combo type name cannot be empty"));
        }
        if total_uses < 1 {
            return Err(DomainError::validation(format!(
                "total uses must be positive (got {total_uses})"
            )));
        }

        Ok(Self {
            name,
            services: services.into(),
            total_uses,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn services(&self) -> &str {
        &self.services
    }

    pub fn total_uses(&self) -> i64 {
        self.total_uses
    }
}

/// A named bundle definition: which services it covers and how many uses a purchase grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboType {
    pub id: ComboTypeId,
    pub name: String,
    pub services: String,
    pub total_uses: i64,
}

/// A combo joined with its catalog entry (name and granted uses).
///
/// This is the read shape returned for a customer's active combos and for a
/// single combo's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboStatus {
    pub id: ComboId,
    pub customer_id: CustomerId,
    pub combo_type_id: ComboTypeId,
    pub name: String,
    pub remaining_uses: i64,
    pub total_uses: i64,
}

impl ComboStatus {
    /// Active combos still have at least one use left.
    pub fn is_active(&self) -> bool {
        self.remaining_uses > 0
    }
}
