//! Per-location CSV export of extracted status rows.
//!
//! One file per (location, status type, taxon group), named
//! `{Location}_{TYPE}_{title}.csv`. Each run overwrites the file with the
//! run's rows; nothing is carried over from a previous export.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use taxref_core::{Table, status::StatusType, taxon::TaxonGroup};
use tracing::debug;

use crate::Result;

/// Title-case `name` word by word, then remove the spaces:
/// `"côte-d'or"` becomes `"Côte-D'Or"`, `"france métropolitaine"` becomes
/// `"FranceMétropolitaine"`.
pub fn normalize_location(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  let mut after_letter = false;
  for c in name.chars() {
    if c.is_alphabetic() {
      if after_letter {
        out.extend(c.to_lowercase());
      } else {
        out.extend(c.to_uppercase());
      }
      after_letter = true;
    } else {
      after_letter = false;
      if c != ' ' {
        out.push(c);
      }
    }
  }
  out
}

pub fn export_file_name(location: &str, status: &StatusType, group: &TaxonGroup) -> String {
  format!("{}_{}_{}.csv", normalize_location(location), status.type_id, group.title)
}

/// Write one CSV per location found in `extracted`, replacing any previous
/// file of the same name. Rows without a location are not exported.
pub fn export_locations(
  dir: &Path,
  extracted: &Table,
  status: &StatusType,
  group: &TaxonGroup,
) -> Result<Vec<PathBuf>> {
  let mut by_location: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
  for (i, row) in extracted.rows().enumerate() {
    let location = row.text("locationName");
    if !location.is_empty() {
      by_location.entry(location).or_default().push(i);
    }
  }

  std::fs::create_dir_all(dir)?;
  let mut written = Vec::with_capacity(by_location.len());
  for (location, indices) in by_location {
    let mut rows = extracted.take(&indices);
    rows.dedup();

    let path = dir.join(export_file_name(location, status, group));
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(rows.columns())?;
    for row in rows.rows() {
      writer.write_record(row.cells().iter().map(|v| v.to_text()))?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "exported");
    written.push(path);
  }
  Ok(written)
}

#[cfg(test)]
mod tests {
  use taxref_core::{Value, extract::LOCATION_COLUMNS, status::PR, taxon::FLORE};

  use super::*;

  fn extracted(rows: &[(&str, i64, &str)]) -> Table {
    let mut columns = vec!["CD_REF", "PR", "source_PR", "sourceId_PR"];
    columns.extend(LOCATION_COLUMNS);
    let mut table = Table::new(columns);
    for (location, cd_ref, code) in rows {
      table
        .push_row(vec![
          Value::Int(*cd_ref),
          Value::from(*code),
          Value::from("Arrêté"),
          Value::from("1"),
          Value::from(*location),
          Value::from("Région"),
          Value::Null,
          Value::Null,
        ])
        .unwrap();
    }
    table
  }

  fn read(path: &Path) -> Vec<Vec<String>> {
    csv::Reader::from_path(path)
      .unwrap()
      .records()
      .map(|r| r.unwrap().iter().map(str::to_owned).collect())
      .collect()
  }

  #[test]
  fn location_names_are_title_cased_without_spaces() {
    assert_eq!(normalize_location("Côte-d'Or"), "Côte-D'Or");
    assert_eq!(normalize_location("france métropolitaine"), "FranceMétropolitaine");
    assert_eq!(normalize_location("PAYS DE LA LOIRE"), "PaysDeLaLoire");
    assert_eq!(export_file_name("Corse", &PR, &FLORE), "Corse_PR_Flore.csv");
  }

  #[test]
  fn one_file_per_location_with_extracted_columns() {
    let dir = tempfile::tempdir().unwrap();
    let table = extracted(&[("Corse", 1, "A"), ("Alsace", 2, "B"), ("Corse", 3, "C")]);
    let written = export_locations(dir.path(), &table, &PR, &FLORE).unwrap();
    assert_eq!(written.len(), 2);

    let corse = dir.path().join("Corse_PR_Flore.csv");
    let mut reader = csv::Reader::from_path(&corse).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_owned).collect();
    assert_eq!(header[..4], ["CD_REF", "PR", "source_PR", "sourceId_PR"]);
    assert_eq!(read(&corse).len(), 2);
  }

  #[test]
  fn rerun_overwrites_instead_of_appending() {
    let dir = tempfile::tempdir().unwrap();
    export_locations(dir.path(), &extracted(&[("Corse", 1, "A"), ("Corse", 2, "B")]), &PR, &FLORE)
      .unwrap();
    export_locations(dir.path(), &extracted(&[("Corse", 9, "Z")]), &PR, &FLORE).unwrap();

    let rows = read(&dir.path().join("Corse_PR_Flore.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "9");
  }

  #[test]
  fn duplicate_rows_are_written_once_and_empty_locations_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let table = extracted(&[("Corse", 1, "A"), ("Corse", 1, "A"), ("", 2, "B")]);
    let written = export_locations(dir.path(), &table, &PR, &FLORE).unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(read(&written[0]).len(), 1);
  }
}
