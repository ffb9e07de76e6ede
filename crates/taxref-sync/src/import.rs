//! Reference checklist import: fetch the version archive, split the
//! checklist into per-group reference lists and store them.

use std::{
  future::Future,
  io::Read,
  path::{Path, PathBuf},
};

use taxref_core::{reference::ChecklistFilter, store::TableStore, taxon::TaxonGroup};
use tokio::io::AsyncWriteExt as _;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{Error, Result, client::RegistryClient, progress, stores::Stores};

/// Name of the checklist inside the archive of `version`.
pub fn checklist_entry(version: i64) -> String { format!("TAXREFv{version}.txt") }

pub fn archive_path(work_dir: &Path, version: i64) -> PathBuf {
  work_dir.join(format!("TAXREFv{version}.zip"))
}

// ─── Download ────────────────────────────────────────────────────────────────

/// Something that can fetch a checklist archive to disk.
pub trait ArchiveSource: Send + Sync {
  /// Download `url` to `dest`, calling `on_progress` with a percentage.
  /// Returns `false` when cancelled; `dest` is then removed.
  fn fetch_archive<'a>(
    &'a self,
    url: &'a str,
    dest: &'a Path,
    cancel: &'a CancellationToken,
    on_progress: &'a (dyn Fn(u8) + Send + Sync),
  ) -> impl Future<Output = Result<bool>> + Send + 'a;
}

impl ArchiveSource for RegistryClient {
  async fn fetch_archive(
    &self,
    url: &str,
    dest: &Path,
    cancel: &CancellationToken,
    on_progress: &(dyn Fn(u8) + Send + Sync),
  ) -> Result<bool> {
    let mut resp = self.get(url).await?;
    let total = resp.content_length().unwrap_or(0);
    let mut file = tokio::fs::File::create(dest).await?;
    let mut received: u64 = 0;
    let mut last = 0;

    loop {
      let chunk = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
          drop(file);
          tokio::fs::remove_file(dest).await?;
          return Ok(false);
        }
        chunk = resp.chunk() => chunk?,
      };
      let Some(chunk) = chunk else { break };
      file.write_all(&chunk).await?;
      received += chunk.len() as u64;
      let percent = progress::percent(received, total);
      if total > 0 && percent != last {
        last = percent;
        on_progress(percent);
      }
    }
    file.flush().await?;
    debug!(bytes = received, path = %dest.display(), "archive downloaded");
    Ok(true)
  }
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Read the checklist of `version` out of `archive` and split it among
/// `groups`.
pub fn read_checklist(
  archive: &Path,
  version: i64,
  groups: &[&'static TaxonGroup],
  include_synonyms: bool,
) -> Result<Vec<(&'static TaxonGroup, taxref_core::Table)>> {
  let file = std::fs::File::open(archive)?;
  let mut zipped = zip::ZipArchive::new(file)?;
  let entry_name = checklist_entry(version);
  let entry = match zipped.by_name(&entry_name) {
    Ok(entry) => entry,
    Err(zip::result::ZipError::FileNotFound) => return Err(Error::ArchiveEntryMissing(entry_name)),
    Err(e) => return Err(e.into()),
  };
  split_checklist(entry, version, groups, include_synonyms)
}

/// Split a tab-delimited checklist with a header row.
pub fn split_checklist(
  reader: impl Read,
  version: i64,
  groups: &[&'static TaxonGroup],
  include_synonyms: bool,
) -> Result<Vec<(&'static TaxonGroup, taxref_core::Table)>> {
  let mut csv = csv::ReaderBuilder::new()
    .delimiter(b'\t')
    .quoting(false)
    .flexible(true)
    .from_reader(reader);
  let header: Vec<String> = csv.headers()?.iter().map(str::to_owned).collect();
  let mut filter = ChecklistFilter::new(&header, groups, version, include_synonyms)?;

  let mut record = csv::StringRecord::new();
  let mut rows = 0usize;
  while csv.read_record(&mut record)? {
    let cells: Vec<&str> = record.iter().collect();
    filter.push(&cells)?;
    rows += 1;
  }
  debug!(rows, "checklist read");
  Ok(filter.finish()?)
}

/// Import the reference lists of `version` from `archive` into both stores,
/// then delete the archive.
pub async fn import_reference<S: TableStore>(
  stores: &Stores<S>,
  archive: &Path,
  version: i64,
  groups: &[&'static TaxonGroup],
  include_synonyms: bool,
) -> Result<usize> {
  let path = archive.to_path_buf();
  let groups_owned = groups.to_vec();
  let lists = tokio::task::spawn_blocking(move || {
    read_checklist(&path, version, &groups_owned, include_synonyms)
  })
  .await??;

  for (group, table) in &lists {
    let name = group.list_table();
    stores
      .reference
      .write_table(&name, table)
      .await
      .map_err(Error::store)?;
    stores
      .status
      .write_table(&name, table)
      .await
      .map_err(Error::store)?;
    info!(group = group.title, rows = table.len(), version, "reference list imported");
  }

  tokio::fs::remove_file(archive).await?;
  Ok(lists.len())
}

#[cfg(test)]
mod tests {
  use taxref_core::{
    Value,
    taxon::{AMPHIBIEN, FLORE},
  };

  use super::*;
  use crate::tests::{CHECKLIST_HEADER, checklist_row as row, write_zip};

  fn checklist() -> String {
    [
      CHECKLIST_HEADER.to_owned(),
      row("Plantae", "Angiospermes", "", 1, 1, "Abies alba"),
      row("Plantae", "Angiospermes", "", 2, 1, "Abies alba syn"),
      row("Animalia", "Amphibiens", "", 3, 3, "Bufo bufo"),
    ]
    .join("\n")
  }

  #[test]
  fn checklist_is_split_per_group_with_version_stamp() {
    let lists =
      split_checklist(checklist().as_bytes(), 17, &[&FLORE, &AMPHIBIEN], false).unwrap();
    let flore = &lists[0].1;
    assert_eq!(lists[0].0.title, "Flore");
    assert_eq!(flore.len(), 1, "synonym row is excluded");
    let first = flore.rows().next().unwrap();
    assert_eq!(first.get("CD_REF"), &Value::Int(1));
    assert_eq!(first.get("VERSION"), &Value::Int(17));
    assert!(!flore.has_column("REGNE"));
  }

  #[test]
  fn missing_entry_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.zip");
    write_zip(&path, "TAXREFv16.txt", &checklist());
    let err = read_checklist(&path, 17, &[&FLORE], false).unwrap_err();
    assert!(matches!(err, Error::ArchiveEntryMissing(name) if name == "TAXREFv17.txt"));
  }

  #[tokio::test]
  async fn import_writes_both_stores_and_removes_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = archive_path(dir.path(), 17);
    write_zip(&path, &checklist_entry(17), &checklist());

    let stores = crate::tests::stores().await;
    let imported = import_reference(&stores, &path, 17, &[&FLORE, &AMPHIBIEN], true)
      .await
      .unwrap();
    assert_eq!(imported, 2);
    assert!(!path.exists());

    let flore = stores.status.read_table("Liste Flore").await.unwrap().unwrap();
    assert_eq!(flore.len(), 2, "synonyms kept on request");
    assert!(stores.reference.read_table("Liste Amphibien").await.unwrap().is_some());
  }
}
