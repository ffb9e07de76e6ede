//! In-memory tabular data.
//!
//! A [`Table`] is an ordered list of named columns over rows of [`Value`]s.
//! It carries exactly the operations the status engine needs (filtering,
//! column union concatenation, outer join on key columns, empty pruning and
//! exact-duplicate removal) and nothing resembling a general query engine.

use std::{
  collections::{HashMap, HashSet},
  fmt,
};

use crate::{Error, Result};

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Value {
  #[default]
  Null,
  Int(i64),
  Text(String),
}

static NULL: Value = Value::Null;

impl Value {
  /// `Null` and empty text both count as empty.
  pub fn is_empty(&self) -> bool {
    match self {
      Value::Null => true,
      Value::Int(_) => false,
      Value::Text(s) => s.is_empty(),
    }
  }

  /// The canonical string used for join keys, so that `Int(1234)` and
  /// `Text("1234")` land on the same key.
  pub fn key_string(&self) -> String {
    match self {
      Value::Null => String::new(),
      Value::Int(i) => i.to_string(),
      Value::Text(s) => s.trim().to_owned(),
    }
  }

  /// Render as text; `Null` becomes the empty string.
  pub fn to_text(&self) -> String {
    match self {
      Value::Null => String::new(),
      Value::Int(i) => i.to_string(),
      Value::Text(s) => s.clone(),
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      Value::Text(s) => s.trim().parse().ok(),
      Value::Null => None,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => Ok(()),
      Value::Int(i) => write!(f, "{i}"),
      Value::Text(s) => f.write_str(s),
    }
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self { Value::Int(i) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Value::Text(s) }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Value::Text(s.to_owned()) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Value::Null, Into::into) }
}

// ─── Row view ────────────────────────────────────────────────────────────────

/// A borrowed view of one table row with by-name cell access.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
  columns: &'a [String],
  cells:   &'a [Value],
}

impl<'a> Row<'a> {
  /// Cell for `name`; `Null` when the column does not exist.
  pub fn get(&self, name: &str) -> &'a Value {
    self
      .columns
      .iter()
      .position(|c| c == name)
      .and_then(|i| self.cells.get(i))
      .unwrap_or(&NULL)
  }

  /// Text content for `name`; empty for `Null`, integers, or missing columns.
  pub fn text(&self, name: &str) -> &'a str { self.get(name).as_str().unwrap_or("") }

  pub fn cells(&self) -> &'a [Value] { self.cells }
}

// ─── Table ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
  columns: Vec<String>,
  rows:    Vec<Vec<Value>>,
}

impl Table {
  /// An empty table with the given columns.
  pub fn new<I, S>(columns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      columns: columns.into_iter().map(Into::into).collect(),
      rows:    Vec::new(),
    }
  }

  /// Build a table from columns and rows, checking every row's width.
  pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut table = Self::new(columns);
    for row in rows {
      table.push_row(row)?;
    }
    Ok(table)
  }

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn has_column(&self, name: &str) -> bool { self.column_index(name).is_some() }

  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == name)
  }

  pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
    if row.len() != self.columns.len() {
      return Err(Error::RowWidth {
        expected: self.columns.len(),
        found:    row.len(),
      });
    }
    self.rows.push(row);
    Ok(())
  }

  pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
    self.rows.iter().map(|cells| Row {
      columns: &self.columns,
      cells:   cells.as_slice(),
    })
  }

  /// Fail with [`Error::MissingColumns`] unless every name is present.
  pub fn require_columns(&self, table: &str, names: &[&str]) -> Result<()> {
    let missing: Vec<String> = names
      .iter()
      .filter(|n| !self.has_column(n))
      .map(|n| (*n).to_owned())
      .collect();
    if missing.is_empty() {
      Ok(())
    } else {
      Err(Error::MissingColumns {
        table:   table.to_owned(),
        columns: missing,
      })
    }
  }

  pub fn column_values(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_> {
    let idx = self
      .column_index(name)
      .ok_or_else(|| Error::UnknownColumn(name.to_owned()))?;
    Ok(self.rows.iter().map(move |r| &r[idx]))
  }

  /// A new table holding the rows at `indices`, in that order.
  pub fn take(&self, indices: &[usize]) -> Table {
    Table {
      columns: self.columns.clone(),
      rows:    indices.iter().filter_map(|&i| self.rows.get(i).cloned()).collect(),
    }
  }

  /// Project onto `names`, in that order.
  pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
    let indices = names
      .iter()
      .map(|n| {
        self
          .column_index(n.as_ref())
          .ok_or_else(|| Error::UnknownColumn(n.as_ref().to_owned()))
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(Table {
      columns: names.iter().map(|n| n.as_ref().to_owned()).collect(),
      rows:    self
        .rows
        .iter()
        .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
        .collect(),
    })
  }

  /// Remove the named columns; names that do not exist are ignored.
  pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) {
    let keep: Vec<bool> = self
      .columns
      .iter()
      .map(|c| !names.iter().any(|n| n.as_ref() == c))
      .collect();
    retain_columns(&mut self.columns, &mut self.rows, &keep);
  }

  /// Set column `name` to `f(row)` for every row, appending it if absent.
  pub fn set_column(&mut self, name: &str, mut f: impl FnMut(Row<'_>) -> Value) {
    let values: Vec<Value> = self.rows().map(&mut f).collect();
    let idx = match self.column_index(name) {
      Some(idx) => idx,
      None => {
        self.columns.push(name.to_owned());
        for row in &mut self.rows {
          row.push(Value::Null);
        }
        self.columns.len() - 1
      }
    };
    for (row, value) in self.rows.iter_mut().zip(values) {
      row[idx] = value;
    }
  }

  /// Rewrite every cell of `name` in place.
  pub fn map_column(&mut self, name: &str, mut f: impl FnMut(&Value) -> Value) -> Result<()> {
    let idx = self
      .column_index(name)
      .ok_or_else(|| Error::UnknownColumn(name.to_owned()))?;
    for row in &mut self.rows {
      row[idx] = f(&row[idx]);
    }
    Ok(())
  }

  /// Render every non-null cell of `name` as text.
  pub fn coerce_to_text(&mut self, name: &str) -> Result<()> {
    self.map_column(name, |v| match v {
      Value::Null => Value::Null,
      other => Value::Text(other.key_string()),
    })
  }

  /// Parse every non-null cell of `name` as an integer.
  pub fn coerce_to_int(&mut self, name: &str) -> Result<()> {
    let idx = self
      .column_index(name)
      .ok_or_else(|| Error::UnknownColumn(name.to_owned()))?;
    for row in &mut self.rows {
      let cell = &row[idx];
      row[idx] = match cell {
        Value::Null => Value::Null,
        Value::Int(i) => Value::Int(*i),
        Value::Text(s) if s.trim().is_empty() => Value::Null,
        Value::Text(s) => Value::Int(s.trim().parse().map_err(|_| Error::NotAnInteger {
          column: name.to_owned(),
          value:  s.clone(),
        })?),
      };
    }
    Ok(())
  }

  /// Stack tables vertically. The result's columns are the union of the
  /// inputs' columns in first-seen order; absent cells are `Null`.
  pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
    let mut out = Table::default();
    for table in tables {
      let positions: Vec<usize> = table
        .columns
        .iter()
        .map(|c| match out.column_index(c) {
          Some(i) => i,
          None => {
            out.columns.push(c.clone());
            for row in &mut out.rows {
              row.push(Value::Null);
            }
            out.columns.len() - 1
          }
        })
        .collect();
      let width = out.columns.len();
      for row in table.rows {
        let mut cells = vec![Value::Null; width];
        for (value, &pos) in row.into_iter().zip(&positions) {
          cells[pos] = value;
        }
        out.rows.push(cells);
      }
    }
    out
  }

  /// Full outer join on `keys`, matching on [`Value::key_string`].
  ///
  /// Output columns are the keys, then the left non-key columns, then the
  /// right non-key columns the left does not have. A non-key column present
  /// on both sides takes the right cell when it is non-empty. Left rows keep
  /// their order (each followed by all its matches); unmatched right rows
  /// follow in their own order.
  pub fn outer_join(&self, right: &Table, keys: &[&str]) -> Result<Table> {
    self.require_columns("left", keys)?;
    right.require_columns("right", keys)?;

    let left_keys: Vec<usize> = keys.iter().filter_map(|k| self.column_index(k)).collect();
    let right_keys: Vec<usize> = keys.iter().filter_map(|k| right.column_index(k)).collect();

    let mut columns: Vec<String> = keys.iter().map(|k| (*k).to_owned()).collect();
    let left_rest: Vec<(usize, usize)> = self
      .columns
      .iter()
      .enumerate()
      .filter(|(_, c)| !keys.contains(&c.as_str()))
      .map(|(i, c)| {
        columns.push(c.clone());
        (i, columns.len() - 1)
      })
      .collect();
    let right_rest: Vec<(usize, usize)> = right
      .columns
      .iter()
      .enumerate()
      .filter(|(_, c)| !keys.contains(&c.as_str()))
      .map(|(i, c)| match columns.iter().position(|o| o == c) {
        Some(pos) => (i, pos),
        None => {
          columns.push(c.clone());
          (i, columns.len() - 1)
        }
      })
      .collect();

    let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (r, row) in right.rows.iter().enumerate() {
      index.entry(key_of(row, &right_keys)).or_default().push(r);
    }

    let width = columns.len();
    let combine = |left: Option<&Vec<Value>>, right_row: Option<&Vec<Value>>| {
      let mut cells = vec![Value::Null; width];
      if let Some(l) = left {
        for (k, &i) in left_keys.iter().enumerate() {
          cells[k] = l[i].clone();
        }
        for &(i, pos) in &left_rest {
          cells[pos] = l[i].clone();
        }
      }
      if let Some(r) = right_row {
        for (k, &i) in right_keys.iter().enumerate() {
          if cells[k].is_empty() {
            cells[k] = r[i].clone();
          }
        }
        for &(i, pos) in &right_rest {
          if !r[i].is_empty() || cells[pos].is_empty() {
            cells[pos] = r[i].clone();
          }
        }
      }
      cells
    };

    let mut matched = vec![false; right.rows.len()];
    let mut rows = Vec::with_capacity(self.rows.len().max(right.rows.len()));
    for l in &self.rows {
      match index.get(&key_of(l, &left_keys)) {
        Some(hits) => {
          for &r in hits {
            matched[r] = true;
            rows.push(combine(Some(l), Some(&right.rows[r])));
          }
        }
        None => rows.push(combine(Some(l), None)),
      }
    }
    for (r, row) in right.rows.iter().enumerate() {
      if !matched[r] {
        rows.push(combine(None, Some(row)));
      }
    }

    Ok(Table { columns, rows })
  }

  /// Drop rows whose every column outside `keys` is empty.
  pub fn drop_empty_rows(&mut self, keys: &[&str]) {
    let value_cols: Vec<usize> = self
      .columns
      .iter()
      .enumerate()
      .filter(|(_, c)| !keys.contains(&c.as_str()))
      .map(|(i, _)| i)
      .collect();
    self
      .rows
      .retain(|row| value_cols.iter().any(|&i| !row[i].is_empty()));
  }

  /// Drop columns whose every cell is empty, except those named in `keep`.
  pub fn drop_empty_columns(&mut self, keep: &[&str]) {
    let flags: Vec<bool> = self
      .columns
      .iter()
      .enumerate()
      .map(|(i, c)| keep.contains(&c.as_str()) || self.rows.iter().any(|r| !r[i].is_empty()))
      .collect();
    retain_columns(&mut self.columns, &mut self.rows, &flags);
  }

  /// Remove exact-duplicate rows, keeping the first occurrence.
  pub fn dedup(&mut self) {
    let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(self.rows.len());
    self.rows.retain(|row| seen.insert(row.clone()));
  }
}

fn key_of(row: &[Value], indices: &[usize]) -> Vec<String> {
  indices.iter().map(|&i| row[i].key_string()).collect()
}

fn retain_columns(columns: &mut Vec<String>, rows: &mut [Vec<Value>], keep: &[bool]) {
  let mut flags = keep.iter();
  columns.retain(|_| *flags.next().unwrap_or(&true));
  for row in rows {
    let mut flags = keep.iter();
    row.retain(|_| *flags.next().unwrap_or(&true));
  }
}
