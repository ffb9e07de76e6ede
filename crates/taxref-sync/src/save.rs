//! Merge & save: fold the intermediates of one run into the persisted
//! tables of the status store.
//!
//! This runs only once every status type of the run has finished, since it
//! reads back all of their intermediates. Each group is merged on its own;
//! a failing group is reported and the others proceed.

use taxref_core::{
  Table,
  merge::{combine_contributions, save_merge},
  status::Scope,
  store::TableStore,
  taxon::TaxonGroup,
};
use tracing::{info, warn};

use crate::{Error, Result, pipeline::Intermediate};

/// Which persisted tables were written, and which groups failed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaveReport {
  pub saved:  Vec<String>,
  pub failed: Vec<(&'static str, String)>,
}

/// The persisted table a scope's contributions land in.
pub fn target_table(group: &TaxonGroup, scope: Scope) -> String {
  match scope {
    Scope::National => group.list_table(),
    Scope::Regional => group.status_table(),
  }
}

pub async fn merge_and_save<S: TableStore>(store: &S, intermediates: &[Intermediate]) -> SaveReport {
  let mut groups: Vec<&'static TaxonGroup> = Vec::new();
  for intermediate in intermediates {
    if !groups.contains(&intermediate.group) {
      groups.push(intermediate.group);
    }
  }

  let mut report = SaveReport::default();
  for group in groups {
    match save_group(store, group, intermediates).await {
      Ok(saved) => report.saved.extend(saved),
      Err(e) => {
        warn!(group = group.title, error = %e, "merge failed; group left unchanged");
        report.failed.push((group.title, e.to_string()));
      }
    }
  }
  report
}

async fn save_group<S: TableStore>(
  store: &S,
  group: &'static TaxonGroup,
  intermediates: &[Intermediate],
) -> Result<Vec<String>> {
  let mut saved = Vec::new();
  for scope in [Scope::National, Scope::Regional] {
    let mut contributions = Vec::new();
    for intermediate in intermediates
      .iter()
      .filter(|i| i.group == group && i.status.scope == scope)
    {
      if let Some(table) = intermediate.read().await? {
        contributions.push(table);
      }
    }
    let Some(contribution) = combine_contributions(contributions, scope)? else {
      continue;
    };

    let target = target_table(group, scope);
    let merged: Table = store
      .update_table(&target, move |old| save_merge(old, contribution, scope, group))
      .await
      .map_err(Error::store)?;
    info!(table = %target, rows = merged.len(), columns = merged.columns().len(), "saved");
    saved.push(target);
  }
  Ok(saved)
}
