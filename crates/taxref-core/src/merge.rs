//! Global merge of status contributions into persisted tables.
//!
//! A persisted table is keyed on `CD_REF` (national list) or `CD_REF` +
//! `Région` (regional statuses). A new contribution always wins for the
//! non-key columns it carries; every other column of the old table is kept.

use crate::{
  Result, Table,
  status::{LRN, STATUS_TYPES, Scope},
  taxon::TaxonGroup,
};

/// Merge `new` into `old` for one group and scope, returning the table to
/// persist.
///
/// A contribution without rows is a no-op and the old table comes back
/// untouched. Empty columns are only pruned after the join, so a column the
/// contribution carries without any value still evicts the old one.
pub fn save_merge(
  old: Option<Table>,
  mut new: Table,
  scope: Scope,
  group: &TaxonGroup,
) -> Result<Table> {
  let keys = scope.keys();

  let Some(mut old) = old else {
    return Ok(finish(new, keys));
  };
  if new.is_empty() {
    return Ok(old);
  }

  old.require_columns("persisted", keys)?;
  new.require_columns("contribution", keys)?;
  for key in keys {
    old.coerce_to_text(key)?;
    new.coerce_to_text(key)?;
  }

  let mut stale: Vec<String> = new
    .columns()
    .iter()
    .filter(|c| !keys.contains(&c.as_str()) && old.has_column(c))
    .cloned()
    .collect();
  if scope == Scope::National && group.is_bird {
    stale.push(LRN.column().to_owned());
  }
  old.drop_columns(&stale);

  let mut merged = old.outer_join(&new, keys)?;
  if scope == Scope::Regional {
    merged.drop_empty_rows(keys);
  }
  Ok(finish(merged, keys))
}

fn finish(mut table: Table, keys: &[&str]) -> Table {
  table.drop_empty_columns(keys);
  let mut table = reorder_columns(&table);
  table.dedup();
  table
}

/// Canonical column order: every column no status type owns, in its current
/// order, then each status type's group in catalog order. Within a group the
/// bare column comes first, then its derived `"<id> - ..."` columns, then
/// `sourceId_<id>`, then `source_<id>`.
pub fn reorder_columns(table: &Table) -> Table {
  let columns = table.columns();
  let mut order: Vec<&str> = columns
    .iter()
    .filter(|c| !STATUS_TYPES.iter().any(|s| s.owns_column(c)))
    .map(String::as_str)
    .collect();

  for status in STATUS_TYPES {
    let source_id = status.source_id_column();
    let source = status.source_column();
    let rank = |c: &str| {
      if c == status.type_id {
        0
      } else if c == source_id {
        2
      } else if c == source {
        3
      } else {
        1
      }
    };
    let mut owned: Vec<&str> = columns
      .iter()
      .map(String::as_str)
      .filter(|c| status.owns_column(c))
      .collect();
    owned.sort_by_key(|c| rank(c));
    order.extend(owned);
  }

  // Every name comes from the table itself, so the projection cannot fail.
  table.select(order.as_slice()).unwrap_or_else(|_| table.clone())
}

/// Fold the intermediate tables of several status types of one scope into
/// a single contribution by outer join on the scope's keys.
pub fn combine_contributions(tables: Vec<Table>, scope: Scope) -> Result<Option<Table>> {
  let keys = scope.keys();
  let mut combined: Option<Table> = None;
  for mut table in tables {
    for key in keys {
      if table.has_column(key) {
        table.coerce_to_text(key)?;
      }
    }
    table.require_columns("intermediate", keys)?;
    combined = Some(match combined {
      None => table,
      Some(acc) => acc.outer_join(&table, keys)?,
    });
  }
  Ok(combined)
}
