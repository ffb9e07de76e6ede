//! Error types for `taxref-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A grouping or merge step needed columns the input table does not have.
  #[error("table {table:?} is missing required columns: {columns:?}")]
  MissingColumns { table: String, columns: Vec<String> },

  #[error("unknown column: {0:?}")]
  UnknownColumn(String),

  #[error("column {column:?} holds a non-integer value: {value:?}")]
  NotAnInteger { column: String, value: String },

  #[error("row has {found} cells but the table has {expected} columns")]
  RowWidth { expected: usize, found: usize },

  #[error("unknown status type: {0:?}")]
  UnknownStatusType(String),

  #[error("unknown taxon group: {0:?}")]
  UnknownTaxonGroup(String),

  #[error("the minimum TAXREF version is 1, requested {0}")]
  InvalidVersion(i64),

  #[error("version {0} not found in the registry version list")]
  VersionNotFound(i64),

  #[error("malformed registry payload: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
