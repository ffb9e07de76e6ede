//! Version and source reconciliation: decide what an update must refresh.

use taxref_core::{
  reference::VERSION_COLUMN,
  record::Source,
  registry::Registry,
  source::{
    SOURCE_TABLE, append_sources, filter_status_sources, new_sources, sources_from_table,
    sources_to_table,
  },
  store::TableStore,
  taxon::TaxonGroup,
};
use tracing::{debug, info};

use crate::{Error, Result, stores::Stores};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  /// Versions match, groups are consistent and no source is new.
  UpToDate,
  /// Re-import the reference lists, then refresh every status.
  Full,
  /// Only statuses need refreshing: new sources have been published.
  StatusOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
  pub local_version:  Option<i64>,
  pub remote_version: i64,
  pub consistent:     bool,
  /// Status-relevant sources absent locally. Only looked up when the
  /// versions agree.
  pub new_sources:    Vec<Source>,
  pub decision:       Decision,
}

/// Minimum `VERSION` over the national lists of `groups`. Any missing
/// table, column or value means there is no usable local version.
pub async fn local_version<S: TableStore>(
  stores: &Stores<S>,
  groups: &[&'static TaxonGroup],
) -> Result<Option<i64>> {
  let mut min: Option<i64> = None;
  for group in groups {
    let Some(table) = stores
      .status
      .read_table(&group.list_table())
      .await
      .map_err(Error::store)?
    else {
      return Ok(None);
    };
    if !table.has_column(VERSION_COLUMN) || table.is_empty() {
      return Ok(None);
    }
    for value in table.column_values(VERSION_COLUMN)? {
      let Some(version) = value.as_int() else {
        return Ok(None);
      };
      min = Some(min.map_or(version, |m| m.min(version)));
    }
  }
  Ok(min)
}

/// Whether every group has both its national list and its regional table
/// in the status store.
pub async fn groups_consistent<S: TableStore>(
  stores: &Stores<S>,
  groups: &[&'static TaxonGroup],
) -> Result<bool> {
  let tables = stores.status.list_tables().await.map_err(Error::store)?;
  Ok(groups.iter().all(|g| {
    tables.contains(&g.list_table()) && tables.contains(&g.status_table())
  }))
}

/// Status-relevant sources of `year` and the year before.
pub async fn remote_sources<R: Registry>(registry: &R, year: i32) -> Result<Vec<Source>> {
  let mut sources = registry
    .sources_for_year(year)
    .await
    .map_err(Error::registry)?;
  sources.extend(
    registry
      .sources_for_year(year - 1)
      .await
      .map_err(Error::registry)?,
  );
  Ok(filter_status_sources(sources))
}

pub async fn local_sources<S: TableStore>(stores: &Stores<S>) -> Result<Vec<Source>> {
  match stores
    .reference
    .read_table(SOURCE_TABLE)
    .await
    .map_err(Error::store)?
  {
    Some(table) => Ok(sources_from_table(&table)?),
    None => Ok(Vec::new()),
  }
}

/// Remote sources of the last two years that the local table lacks.
pub async fn check_sources<S: TableStore, R: Registry>(
  stores: &Stores<S>,
  registry: &R,
  year: i32,
) -> Result<Vec<Source>> {
  let local = local_sources(stores).await?;
  let remote = remote_sources(registry, year).await?;
  let fresh = new_sources(&local, &remote);
  debug!(local = local.len(), remote = remote.len(), new = fresh.len(), "sources compared");
  Ok(fresh)
}

pub async fn reconcile<S: TableStore, R: Registry>(
  stores: &Stores<S>,
  registry: &R,
  groups: &[&'static TaxonGroup],
  year: i32,
) -> Result<Reconciliation> {
  let local_version = local_version(stores, groups).await?;
  let remote_version = registry.current_version().await.map_err(Error::registry)?;
  let consistent = groups_consistent(stores, groups).await?;

  let (decision, new_sources) = if local_version != Some(remote_version) || !consistent {
    (Decision::Full, Vec::new())
  } else {
    let fresh = check_sources(stores, registry, year).await?;
    if fresh.is_empty() { (Decision::UpToDate, fresh) } else { (Decision::StatusOnly, fresh) }
  };

  info!(
    local = ?local_version,
    remote = remote_version,
    consistent,
    new_sources = new_sources.len(),
    ?decision,
    "reconciled"
  );
  Ok(Reconciliation {
    local_version,
    remote_version,
    consistent,
    new_sources,
    decision,
  })
}

/// Persist the `Source` table. On a new version the table is rebuilt from
/// the registry; otherwise `added` is appended to what is stored. Returns
/// the number of stored sources.
pub async fn save_sources<S: TableStore, R: Registry>(
  stores: &Stores<S>,
  registry: &R,
  new_version: bool,
  added: &[Source],
  year: i32,
) -> Result<usize> {
  let sources = if new_version {
    append_sources(Vec::new(), &remote_sources(registry, year).await?)
  } else {
    append_sources(local_sources(stores).await?, added)
  };

  let table = sources_to_table(&sources)?;
  stores
    .reference
    .write_table(SOURCE_TABLE, &table)
    .await
    .map_err(Error::store)?;
  info!(count = sources.len(), "sources saved");
  Ok(sources.len())
}
