//! Encoding helpers between [`Value`] cells and SQLite values, and SQL
//! identifier quoting for the dynamic table and column names.
//!
//! Integers are stored as `INTEGER`, text as `TEXT`, empty cells as `NULL`.
//! Tables are created without declared column types, so SQLite keeps each
//! cell's storage class exactly as written.

use rusqlite::types::{Value as SqlValue, ValueRef};
use taxref_core::Value;

use crate::{Error, Result};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Quote a table or column name as an SQL identifier.
pub fn quote_ident(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }

pub fn validate_table_name(name: &str) -> Result<()> {
  let reserved = name.to_ascii_lowercase().starts_with("sqlite_");
  if reserved || name.trim().is_empty() || name.contains('\0') {
    return Err(Error::InvalidTableName(name.to_owned()));
  }
  Ok(())
}

// ─── Cells ───────────────────────────────────────────────────────────────────

pub fn encode_value(v: &Value) -> SqlValue {
  match v {
    Value::Null => SqlValue::Null,
    Value::Int(i) => SqlValue::Integer(*i),
    Value::Text(s) => SqlValue::Text(s.clone()),
  }
}

/// Decode one cell. Reals that hold an integer come back as integers; other
/// reals and blobs are rendered as text.
pub fn decode_value(v: ValueRef<'_>) -> Value {
  match v {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::Int(i),
    ValueRef::Real(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::Int(f as i64),
    ValueRef::Real(f) => Value::Text(f.to_string()),
    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
      Value::Text(String::from_utf8_lossy(bytes).into_owned())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identifiers_escape_embedded_quotes() {
    assert_eq!(quote_ident("Liste Flore"), "\"Liste Flore\"");
    assert_eq!(quote_ident("LRN - \"x\""), "\"LRN - \"\"x\"\"\"");
  }

  #[test]
  fn reserved_and_empty_names_are_refused() {
    assert!(validate_table_name("Statuts Avifaune").is_ok());
    assert!(matches!(validate_table_name(" "), Err(Error::InvalidTableName(_))));
    assert!(matches!(validate_table_name("sqlite_master"), Err(Error::InvalidTableName(_))));
  }

  #[test]
  fn integral_reals_decode_as_integers() {
    assert_eq!(decode_value(ValueRef::Real(17.0)), Value::Int(17));
    assert_eq!(decode_value(ValueRef::Real(1.5)), Value::Text("1.5".into()));
    assert_eq!(decode_value(ValueRef::Text(b"VU")), Value::Text("VU".into()));
  }
}
