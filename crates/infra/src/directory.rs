//! Customer directory.
//!
//! Customers are always created together with their first combo, and may only
//! leave the directory once none of their combos has uses left.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use combotrack_core::{ComboTypeId, CustomerId, DomainError};
use combotrack_customers::{Customer, CustomerDetails, CustomerProfile};

use crate::db;
use crate::error::{StoreError, StoreResult, is_unique_violation};
use crate::ledger::{self, SqliteComboLedger};

/// SQLite-backed customer directory.
#[derive(Debug, Clone)]
pub struct SqliteCustomerDirectory {
    pool: SqlitePool,
    ledger: SqliteComboLedger,
}

impl SqliteCustomerDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        let ledger = SqliteComboLedger::new(pool.clone());
        Self { pool, ledger }
    }

    /// Register a customer and sell them their first combo, as one transaction.
    ///
    /// A failed combo assignment surfaces as `ComboAssignmentFailed` and leaves
    /// no customer row behind.
    #[tracing::instrument(skip(self, details), fields(phone = details.phone()))]
    pub async fn create_customer(
        &self,
        details: &CustomerDetails,
        initial_combo_type_id: ComboTypeId,
    ) -> StoreResult<CustomerId> {
        let mut tx = db::begin_write(&self.pool).await?;

        let inserted = sqlx::query("INSERT INTO customers (name, phone) VALUES (?1, ?2)")
            .bind(details.name())
            .bind(details.phone())
            .execute(&mut *tx)
            .await;

        let customer_id = match inserted {
            Ok(done) => CustomerId::new(done.last_insert_rowid()),
            Err(err) if is_unique_violation(&err) => {
                return Err(DomainError::DuplicatePhone(details.phone().to_string()).into());
            }
            Err(err) => return Err(err.into()),
        };

        // Dropping `tx` on the error path rolls back the customer insert.
        let combo_id = ledger::assign_combo_on(&mut tx, customer_id, initial_combo_type_id)
            .await
            .map_err(|err| StoreError::from(DomainError::assignment_failed(err.to_string())))?;

        tx.commit().await?;
        tracing::debug!(%customer_id, %combo_id, "customer created");
        Ok(customer_id)
    }

    /// Look a customer up by phone, with their active combos.
    pub async fn get_by_phone(&self, phone: &str) -> StoreResult<CustomerProfile> {
        let row = sqlx::query("SELECT id, name, phone FROM customers WHERE phone = ?1")
            .bind(phone.trim())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.profile(customer_from_row(&row)?).await,
            None => Err(DomainError::not_found(format!("customer with phone '{phone}'")).into()),
        }
    }

    /// Look a customer up by id, with their active combos.
    pub async fn get_by_id(&self, id: CustomerId) -> StoreResult<CustomerProfile> {
        let row = sqlx::query("SELECT id, name, phone FROM customers WHERE id = ?1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.profile(customer_from_row(&row)?).await,
            None => Err(DomainError::not_found(format!("customer {id}")).into()),
        }
    }

    /// Every customer, each with their active combos (one combo query per customer).
    pub async fn list_all(&self) -> StoreResult<Vec<CustomerProfile>> {
        let rows = sqlx::query("SELECT id, name, phone FROM customers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut profiles = Vec::with_capacity(rows.len());
        for row in &rows {
            profiles.push(self.profile(customer_from_row(row)?).await?);
        }
        Ok(profiles)
    }

    #[tracing::instrument(skip(self, details))]
    pub async fn update_customer(&self, id: CustomerId, details: &CustomerDetails) -> StoreResult<()> {
        let updated = sqlx::query("UPDATE customers SET name = ?1, phone = ?2 WHERE id = ?3")
            .bind(details.name())
            .bind(details.phone())
            .bind(id.get())
            .execute(&self.pool)
            .await;

        match updated {
            Ok(done) if done.rows_affected() == 0 => {
                Err(DomainError::not_found(format!("customer {id}")).into())
            }
            Ok(_) => {
                tracing::debug!("customer updated");
                Ok(())
            }
            Err(err) if is_unique_violation(&err) => {
                Err(DomainError::DuplicatePhone(details.phone().to_string()).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a customer who has no active combos left.
    ///
    /// Exhausted combos stay in the ledger as history.
    #[tracing::instrument(skip(self))]
    pub async fn delete_customer(&self, id: CustomerId) -> StoreResult<()> {
        let mut tx = db::begin_write(&self.pool).await?;

        let active = ledger::count_active_combos_on(&mut tx, id).await?;
        if active > 0 {
            return Err(DomainError::HasActiveCombos(id).into());
        }

        let done = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("customer {id}")).into());
        }

        tx.commit().await?;
        tracing::debug!("customer deleted");
        Ok(())
    }

    /// Delete the customer if every combo is used up. Returns whether it was deleted.
    #[tracing::instrument(skip(self))]
    pub async fn prune_if_exhausted(&self, id: CustomerId) -> StoreResult<bool> {
        let active = {
            let mut conn = self.pool.acquire().await?;
            ledger::count_active_combos_on(&mut conn, id).await?
        };
        if active > 0 {
            return Ok(false);
        }

        self.delete_customer(id).await?;
        Ok(true)
    }

    async fn profile(&self, customer: Customer) -> StoreResult<CustomerProfile> {
        let combos = self.ledger.list_active_combos(customer.id).await?;
        Ok(CustomerProfile::new(customer, combos))
    }
}

fn customer_from_row(row: &SqliteRow) -> Result<Customer, sqlx::Error> {
    Ok(Customer {
        id: CustomerId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::db::test_support::FileDb;
    use combotrack_combos::NewComboType;

    struct Fixture {
        pool: SqlitePool,
        directory: SqliteCustomerDirectory,
        ledger: SqliteComboLedger,
        threading: ComboTypeId,
    }

    async fn setup() -> Fixture {
        let pool = connect_in_memory().await.unwrap();
        let ledger = SqliteComboLedger::new(pool.clone());
        let threading = ledger
            .create_combo_type(&NewComboType::new("Threading Combo", "Eyebrow Threading", 3).unwrap())
            .await
            .unwrap();
        Fixture {
            directory: SqliteCustomerDirectory::new(pool.clone()),
            pool,
            ledger,
            threading,
        }
    }

    fn details(name: &str, phone: &str) -> CustomerDetails {
        CustomerDetails::new(name, phone).unwrap()
    }

    async fn customer_rows(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_customer_attaches_initial_combo() {
        let fx = setup().await;
        let id = fx
            .directory
            .create_customer(&details("John Doe", "1234567890"), fx.threading)
            .await
            .unwrap();

        let profile = fx.directory.get_by_phone("1234567890").await.unwrap();
        assert_eq!(profile.customer.id, id);
        assert_eq!(profile.customer.name, "John Doe");
        assert_eq!(profile.combos.len(), 1);
        assert_eq!(profile.combos[0].remaining_uses, 3);
    }

    #[tokio::test]
    async fn create_customer_rejects_duplicate_phone() {
        let fx = setup().await;
        fx.directory
            .create_customer(&details("John Doe", "1234567890"), fx.threading)
            .await
            .unwrap();

        let err = fx
            .directory
            .create_customer(&details("Johnny", "1234567890"), fx.threading)
            .await
            .unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::DuplicatePhone("1234567890".to_string()))
        );
        assert_eq!(customer_rows(&fx.pool).await, 1);
    }

    #[tokio::test]
    async fn failed_combo_assignment_leaves_no_customer_row() {
        let fx = setup().await;
        let err = fx
            .directory
            .create_customer(&details("A", "555-0001"), ComboTypeId::new(999))
            .await
            .unwrap_err();

        assert!(matches!(err.as_domain(), Some(DomainError::ComboAssignmentFailed(_))));
        assert_eq!(customer_rows(&fx.pool).await, 0);
        assert!(fx.directory.get_by_phone("555-0001").await.is_err());
    }

    #[tokio::test]
    async fn get_by_phone_of_unknown_customer_is_not_found() {
        let fx = setup().await;
        let err = fx.directory.get_by_phone("000").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_all_returns_each_customer_with_combos() {
        let fx = setup().await;
        let a = fx
            .directory
            .create_customer(&details("A", "555-0001"), fx.threading)
            .await
            .unwrap();
        fx.directory
            .create_customer(&details("B", "555-0002"), fx.threading)
            .await
            .unwrap();
        fx.ledger.assign_combo(a, fx.threading).await.unwrap();

        let all = fx.directory.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].combos.len(), 2);
        assert_eq!(all[1].combos.len(), 1);
    }

    #[tokio::test]
    async fn update_customer_changes_name_and_phone() {
        let fx = setup().await;
        let id = fx
            .directory
            .create_customer(&details("John Doe", "1234567890"), fx.threading)
            .await
            .unwrap();

        fx.directory
            .update_customer(id, &details("Johnathan Doe", "1112223333"))
            .await
            .unwrap();

        let profile = fx.directory.get_by_id(id).await.unwrap();
        assert_eq!(profile.customer.name, "Johnathan Doe");
        assert_eq!(profile.customer.phone, "1112223333");
    }

    #[tokio::test]
    async fn update_customer_reports_missing_and_duplicate() {
        let fx = setup().await;
        let a = fx
            .directory
            .create_customer(&details("A", "555-0001"), fx.threading)
            .await
            .unwrap();
        fx.directory
            .create_customer(&details("B", "555-0002"), fx.threading)
            .await
            .unwrap();

        let err = fx
            .directory
            .update_customer(CustomerId::new(404), &details("X", "555-9999"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));

        let err = fx
            .directory
            .update_customer(a, &details("A", "555-0002"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::DuplicatePhone(_))));
    }

    #[tokio::test]
    async fn delete_customer_blocked_until_combos_are_used_up() {
        let fx = setup().await;
        let id = fx
            .directory
            .create_customer(&details("A", "555-0001"), fx.threading)
            .await
            .unwrap();
        let combo_id = fx.directory.get_by_id(id).await.unwrap().combos[0].id;

        let err = fx.directory.delete_customer(id).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::HasActiveCombos(id)));

        for _ in 0..3 {
            fx.ledger.consume_use(combo_id).await.unwrap();
        }
        fx.directory.delete_customer(id).await.unwrap();
        assert!(fx.directory.get_by_id(id).await.is_err());

        // History is kept.
        let status = fx.ledger.get_status(combo_id).await.unwrap();
        assert_eq!(status.remaining_uses, 0);
    }

    #[tokio::test]
    async fn prune_if_exhausted_only_removes_drained_customers() {
        let fx = setup().await;
        let id = fx
            .directory
            .create_customer(&details("A", "555-0001"), fx.threading)
            .await
            .unwrap();
        let combo_id = fx.directory.get_by_id(id).await.unwrap().combos[0].id;

        assert!(!fx.directory.prune_if_exhausted(id).await.unwrap());

        for _ in 0..3 {
            fx.ledger.consume_use(combo_id).await.unwrap();
        }
        assert!(fx.directory.prune_if_exhausted(id).await.unwrap());
        assert_eq!(customer_rows(&fx.pool).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_remove_the_customer_once() {
        let db = FileDb::open("delete-race").await;
        let ledger = SqliteComboLedger::new(db.pool.clone());
        let directory = SqliteCustomerDirectory::new(db.pool.clone());
        let one_shot = ledger
            .create_combo_type(&NewComboType::new("Single Facial", "Facial", 1).unwrap())
            .await
            .unwrap();
        let id = directory
            .create_customer(&details("Jane Smith", "555-0100"), one_shot)
            .await
            .unwrap();
        let combo_id = directory.get_by_id(id).await.unwrap().combos[0].id;
        ledger.consume_use(combo_id).await.unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let directory = directory.clone();
                tokio::spawn(async move { directory.delete_customer(id).await })
            })
            .collect();

        let (mut deleted, mut missing) = (0, 0);
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => deleted += 1,
                Err(err) => {
                    assert!(
                        matches!(err.as_domain(), Some(DomainError::NotFound(_))),
                        "unexpected error: {err}"
                    );
                    missing += 1;
                }
            }
        }

        assert_eq!((deleted, missing), (1, 3));
        assert_eq!(customer_rows(&db.pool).await, 0);
    }
}
