//! Bibliographic sources: the discriminant filter, the new-source diff and
//! the `Source` table layout.

use std::collections::HashSet;

use crate::{Result, Table, Value, record::Source};

/// Name of the sources table in the reference store.
pub const SOURCE_TABLE: &str = "Source";

/// Citation substrings that mark a source as relevant to statuses. Matched
/// case-insensitively.
pub const DISCRIMINANTS: &[&str] = &[
  "Liste Rouge",
  "Arrêté",
  "Directive",
  "Plan national",
  "Règlement d'exécution",
  "ZNIEFF",
  "ZNIEFFS",
];

pub fn is_status_source(citation: &str) -> bool {
  let citation = citation.to_lowercase();
  DISCRIMINANTS
    .iter()
    .any(|d| citation.contains(&d.to_lowercase()))
}

/// Keep only the status-relevant sources.
pub fn filter_status_sources(sources: Vec<Source>) -> Vec<Source> {
  sources
    .into_iter()
    .filter(|s| is_status_source(&s.full_citation))
    .collect()
}

/// Remote sources whose id is absent locally, first occurrence per id.
pub fn new_sources(local: &[Source], remote: &[Source]) -> Vec<Source> {
  let mut seen: HashSet<&str> = local.iter().map(|s| s.id.trim()).collect();
  remote
    .iter()
    .filter(|s| seen.insert(s.id.trim()))
    .cloned()
    .collect()
}

/// Append `added` to `existing`, skipping ids already present.
pub fn append_sources(mut existing: Vec<Source>, added: &[Source]) -> Vec<Source> {
  let fresh = new_sources(&existing, added);
  existing.extend(fresh);
  existing
}

pub fn sources_to_table(sources: &[Source]) -> Result<Table> {
  let mut table = Table::new(["id", "fullCitation"]);
  for source in sources {
    table.push_row(vec![
      Value::from(source.id.as_str()),
      Value::from(source.full_citation.as_str()),
    ])?;
  }
  Ok(table)
}

pub fn sources_from_table(table: &Table) -> Result<Vec<Source>> {
  table.require_columns(SOURCE_TABLE, &["id"])?;
  Ok(
    table
      .rows()
      .map(|row| Source {
        id:            row.get("id").key_string(),
        full_citation: row.get("fullCitation").to_text(),
      })
      .collect(),
  )
}
