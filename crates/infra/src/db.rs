//! Connection pool and schema.
//!
//! Foreign keys are declared in the schema but not enforced: exhausted combos
//! outlive the customer that owned them, and deleting a combo type does not
//! touch the combos that reference it.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::StoreResult;

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS combo_types (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT    NOT NULL UNIQUE,
        services    TEXT    NOT NULL DEFAULT '',
        total_uses  INTEGER NOT NULL CHECK (total_uses > 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id     INTEGER PRIMARY KEY AUTOINCREMENT,
        name   TEXT NOT NULL,
        phone  TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS combos (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id     INTEGER NOT NULL REFERENCES customers (id),
        combo_type_id   INTEGER NOT NULL REFERENCES combo_types (id),
        remaining_uses  INTEGER NOT NULL CHECK (remaining_uses >= 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS combos_customer_idx ON combos (customer_id)",
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id  INTEGER NOT NULL REFERENCES customers (id),
        service      TEXT    NOT NULL,
        date         TEXT    NOT NULL,
        start_time   TEXT    NOT NULL,
        end_time     TEXT    NOT NULL,
        combo_id     INTEGER NULL REFERENCES combos (id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS appointments_date_idx ON appointments (date, start_time)",
];

/// Open a pool for a `sqlite://` URL, creating the database file if needed.
pub async fn connect(url: &str) -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(false)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    tracing::info!(url, "opened sqlite pool");
    Ok(pool)
}

/// Single-connection in-memory database with the schema applied.
///
/// The connection is never recycled, since closing it would discard the data.
pub async fn connect_in_memory() -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Start a transaction holding the database write lock from its first statement.
///
/// Used by units that read before they write (overlap checks, delete guards).
/// Concurrent writers then queue on the busy timeout instead of failing the
/// lock upgrade halfway through.
pub(crate) async fn begin_write(pool: &SqlitePool) -> StoreResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Create any missing tables and indexes. Safe to run on every start-up.
pub async fn migrate(pool: &SqlitePool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!(statements = SCHEMA.len(), "schema applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        migrate(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(tables, vec!["appointments", "combo_types", "combos", "customers"]);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU32, Ordering};

    use sqlx::SqlitePool;

    use super::{connect, migrate};

    static NEXT_DB: AtomicU32 = AtomicU32::new(0);

    /// A migrated on-disk database with a multi-connection pool, removed on drop.
    pub(crate) struct FileDb {
        path: PathBuf,
        pub(crate) pool: SqlitePool,
    }

    impl FileDb {
        pub(crate) async fn open(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "combotrack-{name}-{}-{}.db",
                std::process::id(),
                NEXT_DB.fetch_add(1, Ordering::Relaxed)
            ));
            remove_files(&path);

            let pool = connect(&format!("sqlite://{}", path.display())).await.unwrap();
            migrate(&pool).await.unwrap();
            Self { path, pool }
        }
    }

    impl Drop for FileDb {
        fn drop(&mut self) {
            remove_files(&self.path);
        }
    }

    fn remove_files(path: &Path) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
