//! The `TableStore` trait.
//!
//! A table store is a multi-table container: one physical file holding
//! several named tables whose column sets change over time. Backends live in
//! other crates (e.g. `taxref-store-sqlite`).

use std::future::Future;

use crate::Table;

/// Abstraction over a multi-table container.
///
/// Writes replace the named table whole; there is no append.
pub trait TableStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + From<crate::Error> + 'static;

  /// Names of every table in the container.
  fn list_tables(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Read a table fully into memory. Returns `None` if it does not exist.
  fn read_table<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Table>, Self::Error>> + Send + 'a;

  /// Create or overwrite a table.
  fn write_table<'a>(
    &'a self,
    name: &'a str,
    table: &'a Table,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Drop a table. Returns `false` if it did not exist.
  fn drop_table<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Read, transform and write back one table as a single atomic unit.
  ///
  /// No other writer can touch `name` between the read and the write; this
  /// is how concurrent merges into the same persisted table are serialized.
  fn update_table<'a, F>(
    &'a self,
    name: &'a str,
    f: F,
  ) -> impl Future<Output = Result<Table, Self::Error>> + Send + 'a
  where
    F: FnOnce(Option<Table>) -> crate::Result<Table> + Send + 'static;
}
