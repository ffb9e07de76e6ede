//! Status code extraction.
//!
//! Each raw record is reduced to one human-readable code built from up to
//! four fragments joined with `" : "`, in this order:
//!
//! 1. the location name, for department-level records or when the status
//!    type always shows its location;
//! 2. the status-code fragment, chosen by the type's [`CodeRule`];
//! 3. the bird season keywords found in the remarks (national red list,
//!    bird group only);
//! 4. a trailing `Annexe ...` / `Article ...` token of the status name.
//!
//! When no fragment survives the code is [`NO_DATA`].

use std::sync::LazyLock;

use regex::Regex;

use crate::{
  Result, Table, Value,
  record::RawStatusRecord,
  region::{self, AdminLevel},
  status::{CodeRule, LocationRule, StatusType},
  taxon::TaxonGroup,
};

/// Code of a record with no fragment at all.
pub const NO_DATA: &str = "No Data";

/// Season keywords looked up in bird red-list remarks.
pub const BIRD_KEYWORDS: [&str; 3] = ["Nicheur", "Hivernant", "Visiteur"];

static ANNEX_ARTICLE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(Annexe [IVXLCDM]+|Annexe \d+(er)?|Annexe [IVXLCDM]+/\d+|Article [IVXLCDM]+|Article \d+(er)?)$",
  )
  .expect("annex/article pattern compiles")
});

/// Columns of an extracted table besides the three namespaced value columns.
pub const LOCATION_COLUMNS: [&str; 4] =
  ["locationName", "locationAdminLevel", "statusRemarks", "statusName"];

/// The trailing annex or article reference of a status name, if any.
pub fn annex_or_article(status_name: &str) -> Option<&str> {
  ANNEX_ARTICLE
    .captures(status_name)
    .and_then(|c| c.get(1))
    .map(|m| m.as_str())
}

/// Derive the status code of one record. Never fails; absent fields count as
/// empty text.
pub fn extract_status_code(
  record: &RawStatusRecord,
  status: &StatusType,
  group: &TaxonGroup,
) -> String {
  let text = |field: &Option<String>| field.as_deref().unwrap_or("").to_owned();

  let location = match status.location {
    LocationRule::Always => text(&record.location_name),
    LocationRule::DepartmentOnly if record.admin_level() == AdminLevel::Department.as_str() => {
      text(&record.location_name)
    }
    LocationRule::DepartmentOnly => String::new(),
  };

  let keywords = match record.status_remarks.as_deref() {
    Some(remarks) if group.is_bird && status.seasonal_split => BIRD_KEYWORDS
      .iter()
      .filter(|kw| remarks.contains(*kw))
      .copied()
      .collect::<Vec<_>>()
      .join(", "),
    _ => String::new(),
  };

  let status_name = record.status_name.as_deref().unwrap_or("");
  let annex = annex_or_article(status_name).unwrap_or("").to_owned();

  let code = match status.code {
    CodeRule::AsIs => text(&record.status_code),
    CodeRule::StatusName => status_name.to_owned(),
    CodeRule::Suppressed => String::new(),
  };

  let fragments: Vec<String> = [location, code, keywords, annex]
    .into_iter()
    .filter(|f| !f.is_empty())
    .collect();
  if fragments.is_empty() {
    NO_DATA.to_owned()
  } else {
    fragments.join(" : ")
  }
}

/// Whether a record may contribute at all: not a synonym redirect, and not
/// located overseas.
pub fn is_eligible(record: &RawStatusRecord) -> bool {
  record.is_authoritative() && !region::is_overseas(record.location())
}

/// Build the extracted table for one status type and one group: one row per
/// record, with the derived code and the namespaced source columns.
///
/// Columns: `CD_REF`, `<TYPE>`, `source_<TYPE>`, `sourceId_<TYPE>`, then
/// [`LOCATION_COLUMNS`].
pub fn extract_rows<'a>(
  records: impl IntoIterator<Item = &'a RawStatusRecord>,
  status: &StatusType,
  group: &TaxonGroup,
) -> Result<Table> {
  let [code, source, source_id] = status.value_columns();
  let mut table = Table::new(
    ["CD_REF".to_owned(), code, source, source_id]
      .into_iter()
      .chain(LOCATION_COLUMNS.iter().map(|c| (*c).to_owned())),
  );
  for record in records {
    table.push_row(vec![
      Value::from(record.taxon_reference_id),
      Value::from(extract_status_code(record, status, group)),
      Value::from(record.source.clone()),
      Value::from(record.source_id.clone()),
      Value::from(record.location_name.clone()),
      Value::from(record.location_admin_level.clone()),
      Value::from(record.status_remarks.clone()),
      Value::from(record.status_name.clone()),
    ])?;
  }
  Ok(table)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    status::{LRN, LRR, PAPNAT, PN, REGLLUTTE, ZDET},
    taxon::{AVIFAUNE, FLORE},
  };

  fn record(location: &str, level: &str, code: &str, name: &str) -> RawStatusRecord {
    RawStatusRecord {
      taxon_reference_id: Some(1234),
      taxon_id: Some(1234),
      status_code: Some(code.to_owned()),
      location_name: Some(location.to_owned()),
      location_admin_level: Some(level.to_owned()),
      status_name: Some(name.to_owned()),
      ..Default::default()
    }
  }

  #[test]
  fn empty_record_yields_no_data() {
    for status in crate::status::STATUS_TYPES {
      assert_eq!(extract_status_code(&RawStatusRecord::default(), status, &AVIFAUNE), NO_DATA);
    }
  }

  #[test]
  fn location_only_at_department_level() {
    let dept = record("Cantal", "Département", "VU", "");
    let reg = record("Auvergne", "Ancienne région", "VU", "");
    assert_eq!(extract_status_code(&dept, &LRR, &FLORE), "Cantal : VU");
    assert_eq!(extract_status_code(&reg, &LRR, &FLORE), "VU");
  }

  #[test]
  fn znieff_always_shows_location_and_never_its_code() {
    let r = record("Bretagne", "Ancienne région", "D", "");
    assert_eq!(extract_status_code(&r, &ZDET, &FLORE), "Bretagne");
  }

  #[test]
  fn species_control_keeps_location_and_code() {
    let r = record("Corse", "Ancienne région", "Lutte obligatoire", "");
    assert_eq!(extract_status_code(&r, &REGLLUTTE, &FLORE), "Corse : Lutte obligatoire");
  }

  #[test]
  fn protection_types_use_the_article_only() {
    let r = record("France", "État", "PN", "Protection nationale Article 3");
    assert_eq!(extract_status_code(&r, &PN, &FLORE), "Article 3");
  }

  #[test]
  fn priority_action_types_use_the_status_name() {
    let r = record("France", "État", "X", "Priorité action publique");
    assert_eq!(extract_status_code(&r, &PAPNAT, &FLORE), "Priorité action publique");
  }

  #[test]
  fn bird_keywords_follow_the_code() {
    let mut r = record("France métropolitaine", "Territoire", "VU", "");
    r.status_remarks = Some("Nicheur et Visiteur de passage".to_owned());
    assert_eq!(extract_status_code(&r, &LRN, &AVIFAUNE), "VU : Nicheur, Visiteur");
    assert_eq!(extract_status_code(&r, &LRN, &FLORE), "VU");
  }

  #[test]
  fn annex_article_variants() {
    assert_eq!(annex_or_article("Directive Habitat Annexe II/1"), Some("Annexe II/1"));
    assert_eq!(annex_or_article("Annexe IV"), Some("Annexe IV"));
    assert_eq!(annex_or_article("Arrêté Article 1er"), Some("Article 1er"));
    assert_eq!(annex_or_article("Annexe 2"), Some("Annexe 2"));
    assert_eq!(annex_or_article("Article 3 modifié"), None);
  }

  #[test]
  fn extracted_rows_are_namespaced() {
    let mut r = record("Cantal", "Département", "EN", "");
    r.source = Some("Liste rouge Auvergne".to_owned());
    r.source_id = Some("98765".to_owned());
    let table = extract_rows([&r], &LRR, &FLORE).unwrap();
    assert_eq!(&table.columns()[..4], ["CD_REF", "LRR", "source_LRR", "sourceId_LRR"]);
    let row = table.rows().next().unwrap();
    assert_eq!(row.get("CD_REF"), &Value::Int(1234));
    assert_eq!(row.text("LRR"), "Cantal : EN");
    assert_eq!(row.text("sourceId_LRR"), "98765");
  }

  #[test]
  fn overseas_and_synonym_records_are_ineligible() {
    assert!(is_eligible(&record("Cantal", "Département", "", "")));
    assert!(!is_eligible(&record("Réunion", "Département", "", "")));
    let mut synonym = record("Cantal", "Département", "", "");
    synonym.taxon_id = Some(1);
    assert!(!is_eligible(&synonym));
  }
}
