//! The two local stores an update reads and writes.
//!
//! The reference store holds the imported checklists and the `Source`
//! table; the status store holds the national lists (checklist plus national
//! status columns) and the regional status tables.

use std::{collections::HashSet, path::Path};

use taxref_core::{
  store::TableStore,
  taxon::{self, TaxonGroup},
};
use taxref_store_sqlite::SqliteStore;
use tracing::warn;

use crate::{Error, Result, config::SyncConfig};

#[derive(Clone)]
pub struct Stores<S> {
  pub reference: S,
  pub status:    S,
}

impl Stores<SqliteStore> {
  /// Open (or create) both stores under the configured data directory.
  pub async fn open(config: &SyncConfig) -> Result<Self> {
    tokio::fs::create_dir_all(&config.data_dir).await?;
    Ok(Self {
      reference: open_store(&config.reference_store_path()).await?,
      status:    open_store(&config.status_store_path()).await?,
    })
  }
}

async fn open_store(path: &Path) -> Result<SqliteStore> {
  SqliteStore::open(path).await.map_err(Error::store)
}

/// The accepted taxon ids of one group, from its national list.
#[derive(Debug, Clone)]
pub struct GroupReference {
  pub group:   &'static TaxonGroup,
  pub cd_refs: HashSet<i64>,
}

impl GroupReference {
  pub fn accepts(&self, cd_ref: Option<i64>) -> bool {
    cd_ref.is_some_and(|id| self.cd_refs.contains(&id))
  }
}

impl<S: TableStore> Stores<S> {
  /// Groups with a reference list in the reference store, in catalog order.
  /// With none imported yet, every catalog group.
  pub async fn local_groups(&self) -> Result<Vec<&'static TaxonGroup>> {
    let tables = self.reference.list_tables().await.map_err(Error::store)?;
    let groups = taxon::present_in(&tables, "Liste ");
    Ok(if groups.is_empty() { taxon::TAXON_GROUPS.iter().collect() } else { groups })
  }

  /// Load the `CD_REF` set of each group from the status store.
  ///
  /// A group without a national list gets an empty set, so no record can
  /// reach it.
  pub async fn references(&self, groups: &[&'static TaxonGroup]) -> Result<Vec<GroupReference>> {
    let mut out = Vec::with_capacity(groups.len());
    for &group in groups {
      let table = self
        .status
        .read_table(&group.list_table())
        .await
        .map_err(Error::store)?;
      let cd_refs = match table {
        Some(table) => table
          .column_values("CD_REF")?
          .filter_map(|v| v.as_int())
          .collect(),
        None => {
          warn!(group = group.title, "no national list; its statuses will be empty");
          HashSet::new()
        }
      };
      out.push(GroupReference { group, cd_refs });
    }
    Ok(out)
  }
}
