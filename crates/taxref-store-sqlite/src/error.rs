//! Error type for `taxref-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] taxref_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// Empty names and SQLite's reserved `sqlite_` prefix are refused.
  #[error("invalid table name: {0:?}")]
  InvalidTableName(String),

  #[error("cannot write table {0:?} without columns")]
  NoColumns(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
