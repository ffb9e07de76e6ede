//! The SQLite implementation of [`TableStore`].

use std::path::Path;

use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use taxref_core::{Table, Value, store::TableStore};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{decode_value, encode_value, quote_ident, validate_table_name},
  schema::SCHEMA,
};

/// Column names and rows as read from SQLite, before width checking.
type RawTable = (Vec<String>, Vec<Vec<Value>>);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A multi-table container backed by a single SQLite file.
///
/// Clones share one reference-counted connection, so every clone funnels
/// its statements through the same connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Close the connection, releasing the file.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }
}

// ─── Synchronous helpers (connection thread) ─────────────────────────────────

fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        rusqlite::params![name],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn read_raw(conn: &Connection, name: &str) -> rusqlite::Result<Option<RawTable>> {
  if !table_exists(conn, name)? {
    return Ok(None);
  }
  let mut stmt = conn.prepare(&format!("SELECT * FROM {} ORDER BY rowid", quote_ident(name)))?;
  let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
  let width = columns.len();
  let rows = stmt
    .query_map([], |row| {
      (0..width)
        .map(|i| row.get_ref(i).map(decode_value))
        .collect::<rusqlite::Result<Vec<_>>>()
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(Some((columns, rows)))
}

fn write_raw(conn: &Connection, name: &str, table: &Table) -> rusqlite::Result<()> {
  let ident = quote_ident(name);
  let columns = table
    .columns()
    .iter()
    .map(|c| quote_ident(c))
    .collect::<Vec<_>>()
    .join(", ");
  conn.execute_batch(&format!("DROP TABLE IF EXISTS {ident}; CREATE TABLE {ident} ({columns});"))?;

  let placeholders = (1..=table.columns().len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  let mut stmt = conn.prepare(&format!("INSERT INTO {ident} VALUES ({placeholders})"))?;
  for row in table.rows() {
    stmt.execute(rusqlite::params_from_iter(row.cells().iter().map(encode_value)))?;
  }
  Ok(())
}

fn into_table(raw: Option<RawTable>) -> taxref_core::Result<Option<Table>> {
  raw
    .map(|(columns, rows)| Table::from_rows(columns, rows))
    .transpose()
}

fn check_writable(name: &str, table: &Table) -> Result<()> {
  validate_table_name(name)?;
  if table.columns().is_empty() {
    return Err(Error::NoColumns(name.to_owned()));
  }
  Ok(())
}

// ─── TableStore impl ─────────────────────────────────────────────────────────

impl TableStore for SqliteStore {
  type Error = Error;

  async fn list_tables(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name FROM sqlite_master
           WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
           ORDER BY name",
        )?;
        let names = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }

  async fn read_table(&self, name: &str) -> Result<Option<Table>> {
    validate_table_name(name)?;
    let name = name.to_owned();
    let raw = self.conn.call(move |conn| Ok(read_raw(conn, &name)?)).await?;
    Ok(into_table(raw)?)
  }

  async fn write_table(&self, name: &str, table: &Table) -> Result<()> {
    check_writable(name, table)?;
    debug!(table = name, rows = table.len(), columns = table.columns().len(), "writing table");
    let name = name.to_owned();
    let table = table.clone();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write_raw(&tx, &name, &table)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn drop_table(&self, name: &str) -> Result<bool> {
    validate_table_name(name)?;
    let name = name.to_owned();
    let dropped = self
      .conn
      .call(move |conn| {
        let existed = table_exists(conn, &name)?;
        if existed {
          conn.execute_batch(&format!("DROP TABLE {};", quote_ident(&name)))?;
        }
        Ok(existed)
      })
      .await?;
    Ok(dropped)
  }

  async fn update_table<F>(&self, name: &str, f: F) -> Result<Table>
  where
    F: FnOnce(Option<Table>) -> taxref_core::Result<Table> + Send + 'static,
  {
    validate_table_name(name)?;
    let name = name.to_owned();
    // The whole read-modify-write runs inside one IMMEDIATE transaction, so
    // the write lock is held from the read onwards.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = match into_table(read_raw(&tx, &name)?) {
          Ok(current) => current,
          Err(e) => return Ok(Err(Error::Core(e))),
        };
        let next = match f(current) {
          Ok(next) => next,
          Err(e) => return Ok(Err(Error::Core(e))),
        };
        if let Err(e) = check_writable(&name, &next) {
          return Ok(Err(e));
        }
        write_raw(&tx, &name, &next)?;
        tx.commit()?;
        Ok(Ok(next))
      })
      .await?;
    outcome
  }
}
