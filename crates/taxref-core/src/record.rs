//! Registry payloads.
//!
//! The registry is loose about types: identifiers arrive as JSON numbers or
//! numeric strings, and status records carry their taxon ids either nested
//! under `taxon` or flattened as `taxon_referenceId` / `taxon_id`. Every
//! payload is decoded through a private wire struct and normalized here, so
//! the rest of the engine only sees one shape.

use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

use crate::Result;

// ─── Lenient scalars ─────────────────────────────────────────────────────────

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
  Ok(match Option::<Json>::deserialize(d)? {
    None | Some(Json::Null) => None,
    Some(Json::String(s)) => Some(s),
    Some(other) => Some(other.to_string()),
  })
}

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
  Ok(match Option::<Json>::deserialize(d)? {
    Some(Json::Number(n)) => n.as_i64(),
    Some(Json::String(s)) => s.trim().parse().ok(),
    _ => None,
  })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTaxon {
  #[serde(default, deserialize_with = "lenient_id")]
  id:           Option<i64>,
  #[serde(default, deserialize_with = "lenient_id")]
  reference_id: Option<i64>,
}

// ─── RawStatusRecord ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
  #[serde(default)]
  taxon:                Option<WireTaxon>,
  #[serde(default, rename = "taxon_referenceId", deserialize_with = "lenient_id")]
  taxon_reference_id:   Option<i64>,
  #[serde(default, rename = "taxon_id", deserialize_with = "lenient_id")]
  taxon_id:             Option<i64>,
  #[serde(default, deserialize_with = "lenient_text")]
  status_code:          Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  source:               Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  source_id:            Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  location_name:        Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  location_admin_level: Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  status_remarks:       Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  status_name:          Option<String>,
}

/// One status record from a `status/findByType` page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "WireRecord")]
pub struct RawStatusRecord {
  pub taxon_reference_id:   Option<i64>,
  pub taxon_id:             Option<i64>,
  pub status_code:          Option<String>,
  pub source:               Option<String>,
  pub source_id:            Option<String>,
  pub location_name:        Option<String>,
  pub location_admin_level: Option<String>,
  pub status_remarks:       Option<String>,
  pub status_name:          Option<String>,
}

impl From<WireRecord> for RawStatusRecord {
  fn from(w: WireRecord) -> Self {
    let nested = w.taxon.unwrap_or_default();
    Self {
      taxon_reference_id:   w.taxon_reference_id.or(nested.reference_id),
      taxon_id:             w.taxon_id.or(nested.id),
      status_code:          w.status_code,
      source:               w.source,
      source_id:            w.source_id,
      location_name:        w.location_name,
      location_admin_level: w.location_admin_level,
      status_remarks:       w.status_remarks,
      status_name:          w.status_name,
    }
  }
}

impl RawStatusRecord {
  /// A record speaks for its taxon only when it is not a synonym redirect.
  pub fn is_authoritative(&self) -> bool {
    matches!((self.taxon_reference_id, self.taxon_id), (Some(r), Some(id)) if r == id)
  }

  pub fn location(&self) -> &str { self.location_name.as_deref().unwrap_or("") }

  pub fn admin_level(&self) -> &str { self.location_admin_level.as_deref().unwrap_or("") }
}

// ─── Pages ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
  #[serde(default)]
  total_pages: u32,
}

#[derive(Debug, Default, Deserialize)]
struct WireStatusPage {
  #[serde(default)]
  page:     Option<PageInfo>,
  #[serde(default, rename = "_embedded")]
  embedded: Option<StatusEmbedded>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusEmbedded {
  #[serde(default)]
  status: Vec<RawStatusRecord>,
}

/// One page of status records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "WireStatusPage")]
pub struct StatusPage {
  pub total_pages: u32,
  pub records:     Vec<RawStatusRecord>,
}

impl From<WireStatusPage> for StatusPage {
  fn from(w: WireStatusPage) -> Self {
    Self {
      total_pages: w.page.map_or(1, |p| p.total_pages),
      records:     w.embedded.map(|e| e.status).unwrap_or_default(),
    }
  }
}

// ─── Sources ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSource {
  #[serde(default, deserialize_with = "lenient_text")]
  id:            Option<String>,
  #[serde(default, deserialize_with = "lenient_text")]
  full_citation: Option<String>,
}

/// A bibliographic source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "WireSource")]
pub struct Source {
  pub id:            String,
  pub full_citation: String,
}

impl From<WireSource> for Source {
  fn from(w: WireSource) -> Self {
    Self {
      id:            w.id.unwrap_or_default(),
      full_citation: w.full_citation.unwrap_or_default(),
    }
  }
}

#[derive(Debug, Default, Deserialize)]
struct WireSourcePage {
  #[serde(default)]
  page:     Option<PageInfo>,
  #[serde(default, rename = "_embedded")]
  embedded: Option<SourceEmbedded>,
}

#[derive(Debug, Default, Deserialize)]
struct SourceEmbedded {
  #[serde(default)]
  bibliography: Vec<Source>,
}

/// One page of `sources/findByTerm/{year}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "WireSourcePage")]
pub struct SourcePage {
  pub total_pages: u32,
  pub sources:     Vec<Source>,
}

impl From<WireSourcePage> for SourcePage {
  fn from(w: WireSourcePage) -> Self {
    Self {
      total_pages: w.page.map_or(1, |p| p.total_pages),
      sources:     w.embedded.map(|e| e.bibliography).unwrap_or_default(),
    }
  }
}

// ─── Metadata ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireVersion {
  #[serde(default, deserialize_with = "lenient_id")]
  id: Option<i64>,
}

/// Parse `taxrefVersions/current`.
pub fn parse_current_version(body: &str) -> Result<Option<i64>> {
  Ok(serde_json::from_str::<WireVersion>(body)?.id)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTypeId {
  #[serde(default, deserialize_with = "lenient_text")]
  id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypesEmbedded {
  #[serde(default)]
  status_types: Vec<WireTypeId>,
}

#[derive(Debug, Default, Deserialize)]
struct WireTypes {
  #[serde(default, rename = "_embedded")]
  embedded: Option<TypesEmbedded>,
}

/// Parse `status/types` into the list of offered type ids.
pub fn parse_status_types(body: &str) -> Result<Vec<String>> {
  let wire: WireTypes = serde_json::from_str(body)?;
  Ok(
    wire
      .embedded
      .map(|e| e.status_types.into_iter().filter_map(|t| t.id).collect())
      .unwrap_or_default(),
  )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireArchive {
  #[serde(default, deserialize_with = "lenient_text")]
  cd_doc_archive: Option<String>,
}

/// Parse `listAllVersions` into archive codes indexed by `version - 1`.
pub fn parse_archive_codes(body: &str) -> Result<Vec<Option<String>>> {
  let wire: Vec<WireArchive> = serde_json::from_str(body)?;
  Ok(wire.into_iter().map(|a| a.cd_doc_archive).collect())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn flattened_and_nested_taxon_ids_are_equivalent() {
    let flat: RawStatusRecord = serde_json::from_value(json!({
      "taxon_referenceId": "1234", "taxon_id": 1234, "statusCode": "VU"
    }))
    .unwrap();
    let nested: RawStatusRecord = serde_json::from_value(json!({
      "taxon": { "id": "1234", "referenceId": 1234 }, "statusCode": "VU"
    }))
    .unwrap();
    assert_eq!(flat, nested);
    assert!(flat.is_authoritative());
  }

  #[test]
  fn synonym_redirects_are_not_authoritative() {
    let r: RawStatusRecord =
      serde_json::from_value(json!({ "taxon_referenceId": 1, "taxon_id": 2 })).unwrap();
    assert!(!r.is_authoritative());
    assert!(!RawStatusRecord::default().is_authoritative());
  }

  #[test]
  fn numeric_text_fields_become_strings() {
    let r: RawStatusRecord =
      serde_json::from_value(json!({ "sourceId": 98765, "statusName": null })).unwrap();
    assert_eq!(r.source_id.as_deref(), Some("98765"));
    assert_eq!(r.status_name, None);
  }

  #[test]
  fn status_page_reads_total_pages_and_records() {
    let page: StatusPage = serde_json::from_value(json!({
      "page": { "totalPages": 3, "size": 10000 },
      "_embedded": { "status": [ { "taxon_referenceId": 1, "taxon_id": 1 } ] }
    }))
    .unwrap();
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.records.len(), 1);

    let empty: StatusPage = serde_json::from_value(json!({ "page": { "totalPages": 0 } })).unwrap();
    assert!(empty.records.is_empty());
  }

  #[test]
  fn metadata_payloads() {
    assert_eq!(parse_current_version(r#"{"id": 17}"#).unwrap(), Some(17));
    let types =
      parse_status_types(r#"{"_embedded":{"statusTypes":[{"id":"PN"},{"id":"LRN"}]}}"#).unwrap();
    assert_eq!(types, ["PN", "LRN"]);
    let codes = parse_archive_codes(r#"[{"cdDocArchive": 101}, {}]"#).unwrap();
    assert_eq!(codes, [Some("101".to_string()), None]);
  }

  #[test]
  fn source_ids_accept_numbers() {
    let page: SourcePage = serde_json::from_value(json!({
      "_embedded": { "bibliography": [ { "id": 98765, "fullCitation": "Liste rouge" } ] }
    }))
    .unwrap();
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.sources[0].id, "98765");
  }
}
