//! Reference checklist filtering.
//!
//! The TAXREF checklist is a tab-delimited file with one row per name. A
//! [`ChecklistFilter`] consumes it row by row and builds one reference list
//! per taxon group: the rows the group's predicate accepts, stripped of the
//! technical columns and stamped with the checklist version.

use std::collections::BTreeMap;

use crate::{Error, Result, Table, Value, taxon::TaxonGroup};

/// Checklist columns that never reach a reference list.
pub const DROPPED_COLUMNS: &[&str] = &[
  "REGNE", "PHYLUM", "CLASSE", "ORDRE", "SOUS_FAMILLE", "TRIBU", "GROUP1_INPN", "GROUP2_INPN",
  "GROUP3_INPN", "CD_TAXSUP", "CD_SUP", "CD_BA", "URL_INPN", "RANG", "LB_NOM", "LB_AUTEUR",
  "NOM_COMPLET", "NOM_COMPLET_HTML", "NOM_VERN_ENG", "HABITAT", "FR", "GF", "MAR", "GUA", "SM",
  "SB", "SPM", "MAY", "EPA", "REU", "SA", "TA", "TAAF", "PF", "NC", "WF", "CLI", "URL",
];

/// Column holding the checklist version in every reference list.
pub const VERSION_COLUMN: &str = "VERSION";

const REQUIRED_COLUMNS: &[&str] = &[
  "REGNE",
  "GROUP1_INPN",
  "GROUP2_INPN",
  "GROUP3_INPN",
  "ORDRE",
  "FAMILLE",
  "FR",
  "CD_NOM",
  "CD_REF",
];

/// The checklist fields a group predicate looks at, borrowed from one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceRecord<'a> {
  pub kingdom:  &'a str,
  pub group1:   &'a str,
  pub group2:   &'a str,
  pub group3:   &'a str,
  pub order:    &'a str,
  pub family:   &'a str,
  pub presence: &'a str,
  pub cd_nom:   &'a str,
  pub cd_ref:   &'a str,
}

// ─── Layout ──────────────────────────────────────────────────────────────────

/// Column positions resolved once from the checklist header.
#[derive(Debug, Clone)]
struct Layout {
  required: [usize; 9],
  kept:     Vec<usize>,
  names:    Vec<String>,
}

impl Layout {
  fn from_header<S: AsRef<str>>(header: &[S]) -> Result<Self> {
    let position = |name: &str| header.iter().position(|h| h.as_ref() == name);
    let mut required = [0; 9];
    let mut missing = Vec::new();
    for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS.iter().copied()) {
      match position(name) {
        Some(i) => *slot = i,
        None => missing.push(name.to_owned()),
      }
    }
    if !missing.is_empty() {
      return Err(Error::MissingColumns {
        table:   "checklist".to_owned(),
        columns: missing,
      });
    }

    let (kept, names): (Vec<usize>, Vec<String>) = header
      .iter()
      .enumerate()
      .filter(|(_, h)| !DROPPED_COLUMNS.contains(&h.as_ref()))
      .map(|(i, h)| (i, h.as_ref().to_owned()))
      .unzip();
    Ok(Self { required, kept, names })
  }

  fn record<'a>(&self, cells: &[&'a str]) -> ReferenceRecord<'a> {
    let at = |slot: usize| cells.get(self.required[slot]).copied().unwrap_or("");
    ReferenceRecord {
      kingdom:  at(0),
      group1:   at(1),
      group2:   at(2),
      group3:   at(3),
      order:    at(4),
      family:   at(5),
      presence: at(6),
      cd_nom:   at(7).trim(),
      cd_ref:   at(8).trim(),
    }
  }
}

// ─── ChecklistFilter ─────────────────────────────────────────────────────────

/// Streaming splitter of the checklist into per-group reference lists.
pub struct ChecklistFilter {
  layout:           Layout,
  lists:            Vec<(&'static TaxonGroup, Table)>,
  version:          i64,
  include_synonyms: bool,
}

impl ChecklistFilter {
  pub fn new<S: AsRef<str>>(
    header: &[S],
    groups: &[&'static TaxonGroup],
    version: i64,
    include_synonyms: bool,
  ) -> Result<Self> {
    let layout = Layout::from_header(header)?;
    let columns: Vec<String> = layout
      .names
      .iter()
      .cloned()
      .chain(std::iter::once(VERSION_COLUMN.to_owned()))
      .collect();
    let lists = groups
      .iter()
      .map(|g| (*g, Table::new(columns.iter().cloned())))
      .collect();
    Ok(Self {
      layout,
      lists,
      version,
      include_synonyms,
    })
  }

  /// Offer one checklist row to every group.
  pub fn push(&mut self, cells: &[&str]) -> Result<()> {
    let record = self.layout.record(cells);
    let mut row: Option<Vec<Value>> = None;
    for (group, table) in &mut self.lists {
      if !group.matches(&record, self.include_synonyms) {
        continue;
      }
      let values = row.get_or_insert_with(|| {
        self
          .layout
          .kept
          .iter()
          .map(|&i| match cells.get(i).copied().unwrap_or("") {
            "" => Value::Null,
            text => Value::from(text),
          })
          .chain(std::iter::once(Value::Int(self.version)))
          .collect()
      });
      table.push_row(values.clone())?;
    }
    Ok(())
  }

  /// Finalize every list: integer taxon ids, then vernacular deduplication
  /// for the groups that ask for it.
  pub fn finish(self) -> Result<Vec<(&'static TaxonGroup, Table)>> {
    self
      .lists
      .into_iter()
      .map(|(group, mut table)| {
        for id in ["CD_NOM", "CD_REF"] {
          if table.has_column(id) {
            table.coerce_to_int(id)?;
          }
        }
        if group.dedupe_vernacular {
          table = dedupe_vernacular(&table)?;
        }
        Ok((group, table))
      })
      .collect()
  }
}

/// Keep, for each vernacular name, the row with the shortest valid name.
///
/// Rows without a vernacular name are dropped. The output is ordered by
/// vernacular name; ties keep the first row.
pub fn dedupe_vernacular(table: &Table) -> Result<Table> {
  table.require_columns("reference list", &["NOM_VERN", "NOM_VALIDE"])?;
  let mut best: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
  for (i, row) in table.rows().enumerate() {
    let vernacular = row.text("NOM_VERN");
    if vernacular.is_empty() {
      continue;
    }
    let len = row.text("NOM_VALIDE").chars().count();
    best
      .entry(vernacular)
      .and_modify(|slot| {
        if len < slot.1 {
          *slot = (i, len);
        }
      })
      .or_insert((i, len));
  }
  let indices: Vec<usize> = best.values().map(|(i, _)| *i).collect();
  Ok(table.take(&indices))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::taxon::{AVIFAUNE, FLORE};

  const HEADER: &[&str] = &[
    "REGNE", "GROUP1_INPN", "GROUP2_INPN", "GROUP3_INPN", "ORDRE", "FAMILLE", "CD_NOM", "CD_REF",
    "NOM_VALIDE", "NOM_VERN", "FR", "URL",
  ];

  fn bird<'a>(cd_nom: &'a str, name: &'a str, vern: &'a str) -> Vec<&'a str> {
    vec![
      "Animalia", "Chordés", "Oiseaux", "", "Passeriformes", "Paridae", cd_nom, "3764", name, vern,
      "P", "https://inpn.mnhn.fr",
    ]
  }

  #[test]
  fn missing_header_columns_are_reported() {
    let err = ChecklistFilter::new(&["REGNE", "CD_REF"], &[&FLORE], 18, false)
      .err()
      .unwrap();
    assert!(matches!(err, Error::MissingColumns { columns, .. } if columns.contains(&"FR".to_string())));
  }

  #[test]
  fn rows_are_split_by_group_and_stamped_with_version() {
    let mut filter = ChecklistFilter::new(HEADER, &[&FLORE, &AVIFAUNE], 18, false).unwrap();
    filter.push(&bird("3764", "Parus major", "Mésange charbonnière")).unwrap();
    filter
      .push(&[
        "Plantae", "Trachéophytes", "Angiospermes", "", "Fagales", "Fagaceae", "81569", "81569",
        "Quercus robur", "Chêne pédonculé", "P", "",
      ])
      .unwrap();
    let lists = filter.finish().unwrap();

    let (group, flore) = &lists[0];
    assert_eq!(group.title, "Flore");
    assert_eq!(flore.len(), 1);
    assert_eq!(flore.columns(), ["FAMILLE", "CD_NOM", "CD_REF", "NOM_VALIDE", "NOM_VERN", "VERSION"]);
    let row = flore.rows().next().unwrap();
    assert_eq!(row.get("CD_REF"), &Value::Int(81569));
    assert_eq!(row.get("VERSION"), &Value::Int(18));

    assert_eq!(lists[1].1.len(), 1);
  }

  #[test]
  fn synonym_rows_are_skipped() {
    let mut filter = ChecklistFilter::new(HEADER, &[&AVIFAUNE], 18, false).unwrap();
    filter.push(&bird("99999", "Parus major L.", "Mésange")).unwrap();
    let lists = filter.finish().unwrap();
    assert!(lists[0].1.is_empty());
  }

  #[test]
  fn vernacular_dedupe_keeps_shortest_valid_name() {
    let table = Table::from_rows(["NOM_VERN", "NOM_VALIDE"], vec![
      vec!["Mésange".into(), "Parus major major".into()],
      vec!["Mésange".into(), "Parus major".into()],
      vec![Value::Null, "Parus".into()],
      vec!["Bouvreuil".into(), "Pyrrhula pyrrhula".into()],
    ])
    .unwrap();
    let out = dedupe_vernacular(&table).unwrap();
    let names: Vec<_> = out.rows().map(|r| r.text("NOM_VALIDE").to_owned()).collect();
    assert_eq!(names, ["Pyrrhula pyrrhula", "Parus major"]);
  }
}
