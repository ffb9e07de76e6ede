//! The status pipeline: download one status type, split its records among
//! the selected taxon groups, and write one intermediate table per group.
//!
//! Extraction runs page by page; aggregation runs once per group over every
//! extracted row, so each key ends up on exactly one row.

use std::path::{Path, PathBuf};

use taxref_core::{
  Table, aggregate,
  extract::{self, extract_rows},
  record::RawStatusRecord,
  registry::Registry,
  status::{AvailabilityMap, StatusType},
  store::TableStore,
  taxon::TaxonGroup,
};
use taxref_store_sqlite::SqliteStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{Error, Result, export, stores::GroupReference};

/// Columns of the placeholder written for a group that received no record.
pub const EMPTY_COLUMNS: [&str; 2] = ["Région", "CD_REF"];

// ─── Intermediates ───────────────────────────────────────────────────────────

/// One written per-(group, status type) table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intermediate {
  pub group:  &'static TaxonGroup,
  pub status: &'static StatusType,
  pub path:   PathBuf,
}

impl Intermediate {
  pub fn new(work_dir: &Path, group: &'static TaxonGroup, status: &'static StatusType) -> Self {
    let path = work_dir.join(format!("{}.sqlite", intermediate_name(group, status)));
    Self { group, status, path }
  }

  pub fn table_name(&self) -> String { intermediate_name(self.group, self.status) }

  /// Open the file and read its table back.
  pub async fn read(&self) -> Result<Option<Table>> {
    let store = SqliteStore::open(&self.path).await.map_err(Error::store)?;
    let table = store
      .read_table(&self.table_name())
      .await
      .map_err(Error::store)?;
    store.close().await.map_err(Error::store)?;
    Ok(table)
  }

  async fn write(&self, table: &Table) -> Result<()> {
    remove_file(&self.path).await?;
    let store = SqliteStore::open(&self.path).await.map_err(Error::store)?;
    store
      .write_table(&self.table_name(), table)
      .await
      .map_err(Error::store)?;
    store.close().await.map_err(Error::store)?;
    Ok(())
  }
}

pub fn intermediate_name(group: &TaxonGroup, status: &StatusType) -> String {
  format!("{}_{}", group.title, status.type_id)
}

async fn remove_file(path: &Path) -> Result<()> {
  match tokio::fs::remove_file(path).await {
    Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
    _ => Ok(()),
  }
}

/// Delete intermediate files. Failures are logged, not returned, so one
/// stuck file does not keep the others around.
pub async fn discard(intermediates: &[Intermediate]) {
  for intermediate in intermediates {
    if let Err(e) = remove_file(&intermediate.path).await {
      warn!(path = %intermediate.path.display(), error = %e, "could not delete intermediate");
    }
  }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Outcome of one status type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusRun {
  /// The registry does not offer this type; nothing was fetched.
  NotOffered,
  /// Cancelled before completion; nothing was left on disk.
  Cancelled,
  Written(Vec<Intermediate>),
}

/// Everything a status download needs besides the status type itself.
pub struct StatusPipeline<'a, R> {
  pub registry:     &'a R,
  pub references:   &'a [GroupReference],
  pub availability: &'a AvailabilityMap,
  pub work_dir:     &'a Path,
  pub export_dir:   Option<&'a Path>,
  pub cancel:       &'a CancellationToken,
}

impl<R: Registry> StatusPipeline<'_, R> {
  pub async fn run(&self, status: &'static StatusType) -> Result<StatusRun> {
    if !self.availability.is_offered(status) {
      warn!(type_id = status.type_id, "status type not offered by the registry; skipped");
      return Ok(StatusRun::NotOffered);
    }

    let Some(extracted) = self.download(status).await? else {
      return Ok(StatusRun::Cancelled);
    };

    let mut written = Vec::with_capacity(extracted.len());
    for (reference, tables) in self.references.iter().zip(extracted) {
      if self.cancel.is_cancelled() {
        discard(&written).await;
        return Ok(StatusRun::Cancelled);
      }
      match self.finish_group(status, reference.group, tables).await {
        Ok(intermediate) => written.push(intermediate),
        Err(e) => {
          discard(&written).await;
          return Err(e);
        }
      }
    }
    info!(type_id = status.type_id, groups = written.len(), "status intermediates written");
    Ok(StatusRun::Written(written))
  }

  /// Fetch every page, extracting per page. `None` when cancelled.
  async fn download(&self, status: &'static StatusType) -> Result<Option<Vec<Vec<Table>>>> {
    let mut extracted: Vec<Vec<Table>> = vec![Vec::new(); self.references.len()];
    let mut page = 1;
    let mut total_pages = 1;
    while page <= total_pages {
      let fetched = tokio::select! {
        biased;
        _ = self.cancel.cancelled() => return Ok(None),
        fetched = self.registry.status_page(status.type_id, page) => {
          fetched.map_err(Error::registry)?
        }
      };
      total_pages = fetched.total_pages;
      debug!(
        type_id = status.type_id,
        page,
        total_pages,
        records = fetched.records.len(),
        "status page"
      );

      let eligible: Vec<&RawStatusRecord> =
        fetched.records.iter().filter(|r| extract::is_eligible(r)).collect();
      for (reference, tables) in self.references.iter().zip(&mut extracted) {
        let matching = eligible
          .iter()
          .copied()
          .filter(|r| reference.accepts(r.taxon_reference_id));
        let table = extract_rows(matching, status, reference.group)?;
        if !table.is_empty() {
          tables.push(table);
        }
      }
      page += 1;
    }
    Ok(Some(extracted))
  }

  async fn finish_group(
    &self,
    status: &'static StatusType,
    group: &'static TaxonGroup,
    tables: Vec<Table>,
  ) -> Result<Intermediate> {
    let aggregated = if tables.is_empty() {
      Table::new(EMPTY_COLUMNS)
    } else {
      let extracted = Table::concat(tables);
      let aggregated = aggregate::aggregate(&extracted, status, group)?;
      if let Some(dir) = self.export_dir {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || {
          export::export_locations(&dir, &extracted, status, group)
        })
        .await??;
      }
      aggregated
    };

    let intermediate = Intermediate::new(self.work_dir, group, status);
    intermediate.write(&aggregated).await?;
    debug!(
      group = group.title,
      type_id = status.type_id,
      rows = aggregated.len(),
      "intermediate written"
    );
    Ok(intermediate)
  }
}
