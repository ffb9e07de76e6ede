//! The status type catalog.
//!
//! A [`StatusType`] carries every per-type rule the extractor, aggregator
//! and merge step consult as plain fields, so call sites never enumerate
//! type ids themselves. Whether the registry currently offers a type is
//! runtime state and lives in an [`AvailabilityMap`], not in the catalog.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Administrative scope of a status type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
  /// Aggregated per taxon; merged into `Liste <title>`.
  National,
  /// Aggregated per (region, taxon); merged into `Statuts <title>`.
  Regional,
}

impl Scope {
  /// Key columns of the persisted table for this scope.
  pub fn keys(self) -> &'static [&'static str] {
    match self {
      Scope::National => &["CD_REF"],
      Scope::Regional => &["CD_REF", "Région"],
    }
  }
}

/// When the location name contributes to the derived status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationRule {
  /// Only for records at department level.
  DepartmentOnly,
  /// For every record.
  Always,
}

/// Where the status-code fragment of a derived code comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRule {
  /// The record's `statusCode`, verbatim.
  AsIs,
  /// The record's `statusName` instead of its code.
  StatusName,
  /// No status-code fragment.
  Suppressed,
}

// ─── StatusType ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusType {
  pub type_id:        &'static str,
  pub name:           &'static str,
  pub scope:          Scope,
  pub location:       LocationRule,
  pub code:           CodeRule,
  /// Rewrite `" : "` to `" - "` in the aggregated code.
  pub dash_separator: bool,
  /// Split the aggregated code into one column per bird season keyword.
  pub seasonal_split: bool,
}

impl StatusType {
  /// The derived status-code column, named after the type id.
  pub fn column(&self) -> &'static str { self.type_id }

  pub fn source_column(&self) -> String { format!("source_{}", self.type_id) }

  pub fn source_id_column(&self) -> String { format!("sourceId_{}", self.type_id) }

  /// The three columns one status type contributes, in aggregation order.
  pub fn value_columns(&self) -> [String; 3] {
    [
      self.column().to_owned(),
      self.source_column(),
      self.source_id_column(),
    ]
  }

  pub fn is_national(&self) -> bool { self.scope == Scope::National }

  /// Whether `column` belongs to this type's column group: the bare column,
  /// a derived `"<id> - <suffix>"` column, or one of the two source columns.
  pub fn owns_column(&self, column: &str) -> bool {
    column == self.type_id
      || column
        .strip_prefix(self.type_id)
        .is_some_and(|rest| rest.starts_with(" - "))
      || column
        .strip_prefix("sourceId_")
        .or_else(|| column.strip_prefix("source_"))
        .is_some_and(|rest| rest == self.type_id)
  }
}

const fn status(
  type_id: &'static str,
  name: &'static str,
  scope: Scope,
  code: CodeRule,
) -> StatusType {
  StatusType {
    type_id,
    name,
    scope,
    location: LocationRule::DepartmentOnly,
    code,
    dash_separator: false,
    seasonal_split: false,
  }
}

pub const DH: StatusType = status("DH", "Directive Habitat", Scope::National, CodeRule::Suppressed);
pub const DO: StatusType = status("DO", "Directive Oiseaux", Scope::National, CodeRule::Suppressed);
pub const PN: StatusType =
  status("PN", "Protection Nationale", Scope::National, CodeRule::Suppressed);
pub const PR: StatusType =
  status("PR", "Protection Régionale", Scope::Regional, CodeRule::Suppressed);
pub const PD: StatusType =
  status("PD", "Protection Départementale", Scope::Regional, CodeRule::Suppressed);
pub const LRN: StatusType = StatusType {
  seasonal_split: true,
  ..status("LRN", "Liste Rouge Nationale", Scope::National, CodeRule::AsIs)
};
pub const LRR: StatusType =
  status("LRR", "Liste Rouge Régionale", Scope::Regional, CodeRule::AsIs);
pub const PNA: StatusType =
  status("PNA", "Plan National d'Action", Scope::National, CodeRule::StatusName);
pub const PAPNAT: StatusType = status(
  "PAPNAT",
  "Priorité Action Publique Nationale",
  Scope::National,
  CodeRule::StatusName,
);
pub const ZDET: StatusType = StatusType {
  location: LocationRule::Always,
  ..status("ZDET", "ZNIEFF Déterminantes", Scope::Regional, CodeRule::Suppressed)
};
pub const REGLLUTTE: StatusType = StatusType {
  location: LocationRule::Always,
  dash_separator: true,
  ..status("REGLLUTTE", "Lutte contre certaines espèces", Scope::Regional, CodeRule::AsIs)
};

/// Every status type, in canonical column order.
pub const STATUS_TYPES: &[StatusType] =
  &[DH, DO, PN, PR, PD, LRN, LRR, PNA, PAPNAT, ZDET, REGLLUTTE];

pub fn find(type_id: &str) -> Option<&'static StatusType> {
  STATUS_TYPES.iter().find(|s| s.type_id == type_id)
}

/// Resolve ids to catalog entries, keeping the caller's order and dropping
/// repeats.
pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Result<Vec<&'static StatusType>> {
  let mut out: Vec<&'static StatusType> = Vec::with_capacity(ids.len());
  for id in ids {
    let status = find(id.as_ref()).ok_or_else(|| Error::UnknownStatusType(id.as_ref().to_owned()))?;
    if !out.iter().any(|s| s.type_id == status.type_id) {
      out.push(status);
    }
  }
  Ok(out)
}

// ─── Availability ────────────────────────────────────────────────────────────

/// Which status types the registry offers during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityMap {
  offered: HashSet<String>,
}

impl AvailabilityMap {
  pub fn new<I, S>(offered: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      offered: offered.into_iter().map(Into::into).collect(),
    }
  }

  pub fn is_offered(&self, status: &StatusType) -> bool { self.offered.contains(status.type_id) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn catalog_is_in_canonical_order() {
    let ids: Vec<_> = STATUS_TYPES.iter().map(|s| s.type_id).collect();
    assert_eq!(ids, [
      "DH", "DO", "PN", "PR", "PD", "LRN", "LRR", "PNA", "PAPNAT", "ZDET", "REGLLUTTE"
    ]);
  }

  #[test]
  fn scopes_and_rules_follow_the_catalog() {
    assert_eq!(find("PR").unwrap().scope, Scope::Regional);
    assert_eq!(find("PNA").unwrap().code, CodeRule::StatusName);
    assert_eq!(find("ZDET").unwrap().location, LocationRule::Always);
    assert!(find("REGLLUTTE").unwrap().dash_separator);
    assert!(LRN.seasonal_split && !LRR.seasonal_split);
  }

  #[test]
  fn namespaced_columns() {
    assert_eq!(LRR.value_columns(), ["LRR", "source_LRR", "sourceId_LRR"]);
  }

  #[test]
  fn column_ownership_is_exact() {
    assert!(LRN.owns_column("LRN"));
    assert!(LRN.owns_column("LRN - Nicheur"));
    assert!(LRN.owns_column("sourceId_LRN"));
    assert!(!LRN.owns_column("LRNX"));
    assert!(!PN.owns_column("PNA"));
    assert!(!PN.owns_column("source_PNA"));
    assert!(PNA.owns_column("source_PNA"));
  }

  #[test]
  fn from_ids_keeps_caller_order() {
    let ids: Vec<_> = from_ids(&["LRR", "PN", "LRR"]).unwrap().iter().map(|s| s.type_id).collect();
    assert_eq!(ids, ["LRR", "PN"]);
    assert!(matches!(from_ids(&["XX"]), Err(Error::UnknownStatusType(id)) if id == "XX"));
  }

  #[test]
  fn availability_filters_unoffered_types() {
    let map = AvailabilityMap::new(["PN", "LRN"]);
    assert!(map.is_offered(&PN));
    assert!(!map.is_offered(&ZDET));
    assert!(map.is_offered(&LRN));
  }
}
