//! Combo catalog and per-customer combo ledger.
//!
//! The catalog holds combo-type definitions; the ledger holds purchased combos
//! and their remaining-use counters. Counter changes are always single
//! conditional statements evaluated by SQLite, never read-then-write.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use combotrack_combos::{ComboStatus, ComboType, NewComboType};
use combotrack_core::{ComboId, ComboTypeId, CustomerId, DomainError};

use crate::error::{StoreResult, is_unique_violation};

const STATUS_COLUMNS: &str = r#"
    c.id,
    c.customer_id,
    c.combo_type_id,
    ct.name,
    c.remaining_uses,
    ct.total_uses
"#;

/// SQLite-backed combo catalog and ledger.
#[derive(Debug, Clone)]
pub struct SqliteComboLedger {
    pool: SqlitePool,
}

impl SqliteComboLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a catalog entry. Fails with `DuplicateName` if the name is taken.
    #[tracing::instrument(skip(self, combo_type), fields(name = combo_type.name()))]
    pub async fn create_combo_type(&self, combo_type: &NewComboType) -> StoreResult<ComboTypeId> {
        let result = sqlx::query(
            "INSERT INTO combo_types (name, services, total_uses) VALUES (?1, ?2, ?3)",
        )
        .bind(combo_type.name())
        .bind(combo_type.services())
        .bind(combo_type.total_uses())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = ComboTypeId::new(done.last_insert_rowid());
                tracing::debug!(%id, "combo type created");
                Ok(id)
            }
            Err(err) if is_unique_violation(&err) => {
                Err(DomainError::DuplicateName(combo_type.name().to_string()).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// All catalog entries, in storage order.
    pub async fn list_combo_types(&self) -> StoreResult<Vec<ComboType>> {
        let rows = sqlx::query("SELECT id, name, services, total_uses FROM combo_types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(combo_type_from_row)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    /// Remove a catalog entry.
    ///
    /// Combos already sold from this entry are left in place and stop showing
    /// up in joined reads.
    #[tracing::instrument(skip(self))]
    pub async fn delete_combo_type(&self, id: ComboTypeId) -> StoreResult<()> {
        let done = sqlx::query("DELETE FROM combo_types WHERE id = ?1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("combo type {id}")).into());
        }
        tracing::debug!("combo type deleted");
        Ok(())
    }

    /// Sell a combo to a customer with a full use counter.
    ///
    /// The customer id is taken on trust; callers own that check.
    #[tracing::instrument(skip(self))]
    pub async fn assign_combo(
        &self,
        customer_id: CustomerId,
        combo_type_id: ComboTypeId,
    ) -> StoreResult<ComboId> {
        let mut conn = self.pool.acquire().await?;
        assign_combo_on(&mut conn, customer_id, combo_type_id).await
    }

    /// Combos of this customer with at least one use left.
    pub async fn list_active_combos(&self, customer_id: CustomerId) -> StoreResult<Vec<ComboStatus>> {
        let mut conn = self.pool.acquire().await?;
        list_active_combos_on(&mut conn, customer_id).await
    }

    /// Use up one service from a combo.
    ///
    /// Fails with `Exhausted` when the combo does not exist or is already at zero.
    #[tracing::instrument(skip(self))]
    pub async fn consume_use(&self, combo_id: ComboId) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        consume_use_on(&mut conn, combo_id).await
    }

    /// One combo joined with its catalog entry.
    pub async fn get_status(&self, combo_id: ComboId) -> StoreResult<ComboStatus> {
        let sql = format!(
            "SELECT {STATUS_COLUMNS} FROM combos c \
             JOIN combo_types ct ON c.combo_type_id = ct.id \
             WHERE c.id = ?1"
        );
        let row = sqlx::query(&sql)
            .bind(combo_id.get())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(combo_status_from_row(&row)?),
            None => Err(DomainError::not_found(format!("combo {combo_id}")).into()),
        }
    }
}

pub(crate) async fn assign_combo_on(
    conn: &mut SqliteConnection,
    customer_id: CustomerId,
    combo_type_id: ComboTypeId,
) -> StoreResult<ComboId> {
    let total_uses: Option<i64> =
        sqlx::query_scalar("SELECT total_uses FROM combo_types WHERE id = ?1")
            .bind(combo_type_id.get())
            .fetch_optional(&mut *conn)
            .await?;

    let Some(total_uses) = total_uses else {
        return Err(DomainError::not_found(format!("combo type {combo_type_id}")).into());
    };

    let done = sqlx::query(
        "INSERT INTO combos (customer_id, combo_type_id, remaining_uses) VALUES (?1, ?2, ?3)",
    )
    .bind(customer_id.get())
    .bind(combo_type_id.get())
    .bind(total_uses)
    .execute(&mut *conn)
    .await?;

    let combo_id = ComboId::new(done.last_insert_rowid());
    tracing::debug!(%combo_id, %customer_id, total_uses, "combo assigned");
    Ok(combo_id)
}

pub(crate) async fn consume_use_on(conn: &mut SqliteConnection, combo_id: ComboId) -> StoreResult<()> {
    // Guard and decrement in one statement; two callers racing on the last
    // use cannot both match `remaining_uses > 0`.
    let done = sqlx::query(
        "UPDATE combos SET remaining_uses = remaining_uses - 1 \
         WHERE id = ?1 AND remaining_uses > 0",
    )
    .bind(combo_id.get())
    .execute(&mut *conn)
    .await?;

    if done.rows_affected() == 0 {
        return Err(DomainError::Exhausted(combo_id).into());
    }
    tracing::debug!(%combo_id, "combo use consumed");
    Ok(())
}

pub(crate) async fn list_active_combos_on(
    conn: &mut SqliteConnection,
    customer_id: CustomerId,
) -> StoreResult<Vec<ComboStatus>> {
    let sql = format!(
        "SELECT {STATUS_COLUMNS} FROM combos c \
         JOIN combo_types ct ON c.combo_type_id = ct.id \
         WHERE c.customer_id = ?1 AND c.remaining_uses > 0 \
         ORDER BY c.id"
    );
    let rows = sqlx::query(&sql)
        .bind(customer_id.get())
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(combo_status_from_row)
        .collect::<Result<_, _>>()
        .map_err(Into::into)
}

/// Count of active combos, including ones whose catalog entry was deleted.
pub(crate) async fn count_active_combos_on(
    conn: &mut SqliteConnection,
    customer_id: CustomerId,
) -> StoreResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM combos WHERE customer_id = ?1 AND remaining_uses > 0")
            .bind(customer_id.get())
            .fetch_one(&mut *conn)
            .await?;
    Ok(count)
}

fn combo_type_from_row(row: &SqliteRow) -> Result<ComboType, sqlx::Error> {
    Ok(ComboType {
        id: ComboTypeId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        services: row.try_get("services")?,
        total_uses: row.try_get("total_uses")?,
    })
}

fn combo_status_from_row(row: &SqliteRow) -> Result<ComboStatus, sqlx::Error> {
    Ok(ComboStatus {
        id: ComboId::new(row.try_get("id")?),
        customer_id: CustomerId::new(row.try_get("customer_id")?),
        combo_type_id: ComboTypeId::new(row.try_get("combo_type_id")?),
        name: row.try_get("name")?,
        remaining_uses: row.try_get("remaining_uses")?,
        total_uses: row.try_get("total_uses")?,
    })
}
