//! Administrative-level aggregation.
//!
//! Turns an extracted table (one row per location mention) into one row per
//! taxon for national types, or one row per (historical region, taxon) for
//! regional types. Levels are processed in [`AdminLevel::ALL`] order and
//! their partial results stacked; a taxon with no row at some level simply
//! contributes nothing for that level.

use std::collections::BTreeMap;

use crate::{
  Result, Table, Value,
  extract::BIRD_KEYWORDS,
  region::{AdminLevel, FRANCE_NAMES, HistoricalRegion, REGIONS},
  status::{Scope, StatusType},
  table::Row,
  taxon::TaxonGroup,
};

/// Separator between the values of one group.
pub const JOIN_SEPARATOR: &str = "; ";

/// Sort key for taxon ids: numeric when possible, textual otherwise.
type RefKey = (Option<i64>, String);

fn ref_key(value: &Value) -> RefKey { (value.as_int(), value.key_string()) }

/// Joined value columns, one `Vec` of contributions per column.
type Contributions = [Vec<String>; 3];

/// Aggregate an extracted table for `status` within `group`.
pub fn aggregate(extracted: &Table, status: &StatusType, group: &TaxonGroup) -> Result<Table> {
  let value_columns = status.value_columns();
  let mut required = vec!["CD_REF", "locationName", "locationAdminLevel"];
  required.extend(value_columns.iter().map(String::as_str));
  extracted.require_columns(status.type_id, &required)?;

  let keys: &[&str] = match status.scope {
    Scope::National => &["CD_REF"],
    Scope::Regional => &["Région", "CD_REF"],
  };
  let mut out = Table::new(
    keys
      .iter()
      .map(|k| (*k).to_owned())
      .chain(value_columns.clone()),
  );

  for level in AdminLevel::ALL {
    match status.scope {
      Scope::National => {
        let groups = group_by_ref(extracted, &value_columns, |row| {
          at_level(row, level) && FRANCE_NAMES.contains(&row.text("locationName"))
        });
        for ((_, cd_ref), values) in groups {
          out.push_row(std::iter::once(Value::Text(cd_ref)).chain(joined(values)).collect())?;
        }
      }
      Scope::Regional => {
        for region in REGIONS {
          let groups = group_by_ref(extracted, &value_columns, |row| {
            at_level(row, level) && covers(region, row)
          });
          for ((_, cd_ref), values) in groups {
            out.push_row(
              [Value::from(region.name), Value::Text(cd_ref)]
                .into_iter()
                .chain(joined(values))
                .collect(),
            )?;
          }
        }
      }
    }
  }

  let code = status.column();
  if group.is_bird && status.seasonal_split {
    for keyword in BIRD_KEYWORDS {
      out.set_column(&format!("{code} - {keyword}"), |row| {
        match filter_by_keyword(row.text(code), keyword) {
          kept if kept.is_empty() => Value::Null,
          kept => Value::Text(kept),
        }
      });
    }
  }
  if status.dash_separator {
    out.map_column(code, |v| match v {
      Value::Text(s) => Value::Text(s.replace(" : ", " - ")),
      other => other.clone(),
    })?;
  }
  out.coerce_to_int("CD_REF")?;
  Ok(out)
}

/// Keep the `;`-separated segments of `joined` that mention `keyword`, with
/// the `" : <keyword>"` suffix removed.
pub fn filter_by_keyword(joined: &str, keyword: &str) -> String {
  let suffix = format!(" : {keyword}");
  joined
    .split(';')
    .map(str::trim)
    .filter(|segment| segment.contains(keyword))
    .map(|segment| segment.replace(&suffix, ""))
    .collect::<Vec<_>>()
    .join(";")
}

fn at_level(row: &Row<'_>, level: AdminLevel) -> bool {
  row.text("locationAdminLevel") == level.as_str()
}

fn covers(region: &HistoricalRegion, row: &Row<'_>) -> bool {
  region.covers(row.text("locationName"))
}

fn group_by_ref(
  table: &Table,
  value_columns: &[String; 3],
  mut keep: impl FnMut(&Row<'_>) -> bool,
) -> BTreeMap<RefKey, Contributions> {
  let mut groups: BTreeMap<RefKey, Contributions> = BTreeMap::new();
  for row in table.rows().filter(|row| keep(row)) {
    let key = ref_key(row.get("CD_REF"));
    if key.1.is_empty() {
      continue;
    }
    let slot = groups.entry(key).or_default();
    for (values, column) in slot.iter_mut().zip(value_columns) {
      values.push(row.get(column).to_text());
    }
  }
  groups
}

fn joined(values: Contributions) -> impl Iterator<Item = Value> {
  values.into_iter().map(|v| Value::Text(v.join(JOIN_SEPARATOR)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    extract::extract_rows,
    record::RawStatusRecord,
    status::{LRN, LRR, PN, REGLLUTTE},
    taxon::{AVIFAUNE, FLORE},
  };

  fn record(cd_ref: i64, location: &str, level: &str, code: &str) -> RawStatusRecord {
    RawStatusRecord {
      taxon_reference_id: Some(cd_ref),
      taxon_id: Some(cd_ref),
      status_code: Some(code.to_owned()),
      source: Some(format!("src-{code}")),
      source_id: Some(format!("{cd_ref}")),
      location_name: Some(location.to_owned()),
      location_admin_level: Some(level.to_owned()),
      ..Default::default()
    }
  }

  fn run(records: &[RawStatusRecord], status: &StatusType, group: &TaxonGroup) -> Table {
    aggregate(&extract_rows(records, status, group).unwrap(), status, group).unwrap()
  }

  #[test]
  fn department_rows_land_under_their_historical_region() {
    let out = run(&[record(10, "Cantal", "Département", "VU")], &LRR, &FLORE);
    assert_eq!(out.columns(), ["Région", "CD_REF", "LRR", "source_LRR", "sourceId_LRR"]);
    assert_eq!(out.len(), 1);
    let row = out.rows().next().unwrap();
    assert_eq!(row.text("Région"), "Auvergne");
    assert_eq!(row.get("CD_REF"), &Value::Int(10));
    assert_eq!(row.text("LRR"), "Cantal : VU");
  }

  #[test]
  fn unknown_departments_are_dropped_from_regional_output() {
    let out = run(&[record(10, "Seine-et-Oise", "Département", "VU")], &LRR, &FLORE);
    assert!(out.is_empty());
  }

  #[test]
  fn moselle_and_belfort_reach_their_regions() {
    let out = run(
      &[
        record(10, "Moselle", "Département", "VU"),
        record(11, "Territoire de Belfort", "Département", "EN"),
      ],
      &LRR,
      &FLORE,
    );
    let rows: Vec<_> = out
      .rows()
      .map(|r| (r.text("Région").to_owned(), r.text("LRR").to_owned()))
      .collect();
    assert!(rows.contains(&("Lorraine".to_owned(), "Moselle : VU".to_owned())));
    assert!(rows.contains(&("Franche-Comté".to_owned(), "Territoire de Belfort : EN".to_owned())));
    assert_eq!(rows.len(), 2);
  }

  #[test]
  fn current_region_names_fan_out_to_every_historical_region() {
    let out = run(&[record(10, "Grand-Est", "Région", "NT")], &LRR, &FLORE);
    let regions: Vec<_> = out.rows().map(|r| r.text("Région").to_owned()).collect();
    assert_eq!(regions, ["Champagne-Ardenne", "Alsace", "Lorraine"]);
  }

  #[test]
  fn same_key_values_are_joined_not_overwritten() {
    let out = run(
      &[
        record(10, "Cantal", "Département", "VU"),
        record(10, "Allier", "Département", "EN"),
      ],
      &LRR,
      &FLORE,
    );
    assert_eq!(out.len(), 1);
    let row = out.rows().next().unwrap();
    assert_eq!(row.text("LRR"), "Cantal : VU; Allier : EN");
    assert_eq!(row.text("source_LRR"), "src-VU; src-EN");
  }

  #[test]
  fn national_aggregation_keeps_only_country_rows() {
    let mut france = record(20, "France", "État", "");
    france.status_name = Some("Protection nationale Article 2".to_owned());
    let out = run(&[france, record(20, "Bretagne", "Ancienne région", "")], &PN, &FLORE);
    assert_eq!(out.columns(), ["CD_REF", "PN", "source_PN", "sourceId_PN"]);
    assert_eq!(out.len(), 1);
    assert_eq!(out.rows().next().unwrap().text("PN"), "Article 2");
  }

  #[test]
  fn national_rows_must_match_the_level_being_processed() {
    let out = run(
      &[
        record(20, "France", "État", "LC"),
        record(20, "France métropolitaine", "Territoire", "NT"),
      ],
      &LRN,
      &FLORE,
    );
    let codes: Vec<_> = out.rows().map(|r| r.text("LRN").to_owned()).collect();
    assert_eq!(codes, ["LC", "NT"]);
  }

  #[test]
  fn bird_red_list_is_split_per_season() {
    assert_eq!(filter_by_keyword("France : Nicheur;France : Hivernant", "Nicheur"), "France");
    assert_eq!(filter_by_keyword("VU : Nicheur; LC : Hivernant", "Hivernant"), "LC");

    let mut nicheur = record(30, "France métropolitaine", "Territoire", "VU");
    nicheur.status_remarks = Some("Nicheur".to_owned());
    let mut hivernant = record(30, "France métropolitaine", "Territoire", "LC");
    hivernant.status_remarks = Some("Hivernant".to_owned());
    let out = run(&[nicheur, hivernant], &LRN, &AVIFAUNE);
    let row = out.rows().next().unwrap();
    assert_eq!(row.text("LRN"), "VU : Nicheur; LC : Hivernant");
    assert_eq!(row.text("LRN - Nicheur"), "VU");
    assert_eq!(row.text("LRN - Hivernant"), "LC");
    assert_eq!(row.get("LRN - Visiteur"), &Value::Null);
  }

  #[test]
  fn species_control_uses_dash_separator() {
    let out = run(&[record(40, "Corse", "Ancienne région", "Lutte")], &REGLLUTTE, &FLORE);
    assert_eq!(out.rows().next().unwrap().text("REGLLUTTE"), "Corse - Lutte");
  }

  #[test]
  fn missing_columns_are_reported() {
    let table = Table::new(["CD_REF", "LRR"]);
    assert!(matches!(
      aggregate(&table, &LRR, &FLORE),
      Err(crate::Error::MissingColumns { .. })
    ));
  }
}
