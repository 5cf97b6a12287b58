//! Infrastructure layer: SQLite store, schema, and the ledger, directory and
//! appointment book built on it.

pub mod appointments;
pub mod db;
pub mod directory;
pub mod error;
pub mod ledger;


pub use appointments::SqliteAppointmentBook;
pub use db::{connect, connect_in_memory, migrate};
pub use directory::SqliteCustomerDirectory;
pub use error::{StoreError, StoreResult};
pub use ledger::SqliteComboLedger;
