//! SQLite backend for TAXREF table stores.
//!
//! One SQLite file is one multi-table container. Tables carry whatever
//! columns the last write gave them; cells keep their SQLite storage class
//! (`NULL`, `INTEGER` or `TEXT`). All database access runs on the
//! [`tokio_rusqlite`] connection thread.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
