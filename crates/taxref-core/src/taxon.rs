//! The taxon group catalog.
//!
//! Each [`TaxonGroup`] is a static filter over the reference checklist. The
//! catalog is immutable; groups are looked up by title.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, reference::ReferenceRecord};

/// Kingdom of a taxon group, as spelled in the checklist's `REGNE` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kingdom {
  Plantae,
  Animalia,
  Fungi,
}

impl Kingdom {
  pub fn as_str(self) -> &'static str {
    match self {
      Kingdom::Plantae => "Plantae",
      Kingdom::Animalia => "Animalia",
      Kingdom::Fungi => "Fungi",
    }
  }
}

/// French presence codes (`FR` column) that qualify a taxon for a list.
pub const PRESENCE_CODES: &[&str] = &["P", "E", "S", "C", "I", "J", "M", "B", "D", "G"];

// ─── TaxonGroup ──────────────────────────────────────────────────────────────

/// A named biological grouping. An empty filter slice matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonGroup {
  pub title:             &'static str,
  pub kingdom:           Kingdom,
  pub orders:            &'static [&'static str],
  pub group1:            &'static [&'static str],
  pub group2:            &'static [&'static str],
  pub group3:            &'static [&'static str],
  pub families:          &'static [&'static str],
  /// Birds get the seasonal red-list split and their own national save rule.
  pub is_bird:           bool,
  /// Keep one row per vernacular name when importing the checklist.
  pub dedupe_vernacular: bool,
}

impl TaxonGroup {
  /// Whether a checklist row belongs to this group.
  ///
  /// `GROUP2_INPN`, `GROUP3_INPN` and `FAMILLE` are nested: an empty level
  /// stops evaluation of the narrower ones.
  pub fn matches(&self, record: &ReferenceRecord<'_>, include_synonyms: bool) -> bool {
    if record.kingdom != self.kingdom.as_str() || !listed(self.group1, record.group1) {
      return false;
    }
    if !self.orders.is_empty() && !listed(self.orders, record.order) {
      return false;
    }
    if !nested_levels_match(self, record) {
      return false;
    }
    if !listed(PRESENCE_CODES, record.presence) {
      return false;
    }
    include_synonyms || record.cd_nom == record.cd_ref
  }

  /// Name of the national list table for this group.
  pub fn list_table(&self) -> String { format!("Liste {}", self.title) }

  /// Name of the regional status table for this group.
  pub fn status_table(&self) -> String { format!("Statuts {}", self.title) }
}

fn nested_levels_match(group: &TaxonGroup, record: &ReferenceRecord<'_>) -> bool {
  if group.group2.is_empty() {
    return true;
  }
  if !listed(group.group2, record.group2) {
    return false;
  }
  if group.group3.is_empty() {
    return true;
  }
  if !listed(group.group3, record.group3) {
    return false;
  }
  group.families.is_empty() || listed(group.families, record.family)
}

fn listed(list: &[&str], value: &str) -> bool { list.iter().any(|v| *v == value) }

// ─── Catalog ─────────────────────────────────────────────────────────────────

const fn group(
  title: &'static str,
  kingdom: Kingdom,
  orders: &'static [&'static str],
  group1: &'static [&'static str],
  group2: &'static [&'static str],
  group3: &'static [&'static str],
  families: &'static [&'static str],
) -> TaxonGroup {
  TaxonGroup {
    title,
    kingdom,
    orders,
    group1,
    group2,
    group3,
    families,
    is_bird: false,
    dedupe_vernacular: false,
  }
}

pub const FLORE: TaxonGroup = group(
  "Flore",
  Kingdom::Plantae,
  &[],
  &["Algues", "Trachéophytes", "Bryophytes"],
  &[],
  &[],
  &[],
);

pub const FONGE: TaxonGroup =
  group("Fonge", Kingdom::Fungi, &[], &["Ascomycètes", "Basidomycètes"], &[], &[], &[]);

pub const AMPHIBIEN: TaxonGroup = TaxonGroup {
  dedupe_vernacular: true,
  ..group("Amphibien", Kingdom::Animalia, &[], &["Chordés"], &["Amphibiens"], &[], &[])
};

pub const REPTILE: TaxonGroup = TaxonGroup {
  dedupe_vernacular: true,
  ..group("Reptile", Kingdom::Animalia, &[], &["Chordés"], &["Reptiles"], &[], &[])
};

pub const AVIFAUNE: TaxonGroup = TaxonGroup {
  is_bird: true,
  dedupe_vernacular: true,
  ..group("Avifaune", Kingdom::Animalia, &[], &["Chordés"], &["Oiseaux"], &[], &[])
};

pub const MAMMIFERE: TaxonGroup = TaxonGroup {
  dedupe_vernacular: true,
  ..group(
    "Mammifere",
    Kingdom::Animalia,
    &[
      "Afrosoricida",
      "Carnivora",
      "Cetartiodactyla",
      "Diprotodontia",
      "Eulipotyphla",
      "Lagomorpha",
      "Perissodactyla",
      "Proboscidea",
      "Rodentia",
    ],
    &["Chordés"],
    &["Mammifères"],
    &[],
    &[],
  )
};

pub const CHIROPTERE: TaxonGroup = group(
  "Chiroptere",
  Kingdom::Animalia,
  &["Chiroptera"],
  &["Chordés"],
  &["Mammifères"],
  &["Autres"],
  &[],
);

pub const LEPIDOPTERE: TaxonGroup = group(
  "Lepidoptere",
  Kingdom::Animalia,
  &[],
  &["Arthropodes"],
  &["Insectes"],
  &["Lépidoptères"],
  &[
    "Papilionidae",
    "Pieridae",
    "Nymphalidae",
    "Satyrinae",
    "Lycaenidae",
    "Hesperiidae",
    "Zygaenidae",
  ],
);

pub const ODONATE: TaxonGroup = group(
  "Odonate",
  Kingdom::Animalia,
  &[],
  &["Arthropodes"],
  &["Insectes"],
  &["Odonates"],
  &[],
);

pub const COLEOPTERE: TaxonGroup = group(
  "Coleoptere",
  Kingdom::Animalia,
  &[],
  &["Arthropodes"],
  &["Insectes"],
  &["Coléoptères"],
  &[
    "Carabidae", "Hydrophilidae", "Sphaeritidae", "Histeridae", "Ptiliidae",
    "Agyrtidae", "Leiodidae", "Staphylinidae", "Lucanidae", "Trogidae",
    "Scarabaeidae", "Eucinetidae", "Clambidae", "Scirtidae", "Buprestidae",
    "Elmidae", "Dryopidae", "Cerophytidae", "Eucnemidae", "Throscidae",
    "Elateridae", "Lycidae", "Cantharidae", "Derodontidae", "Nosodendridae",
    "Dermestidae", "Endecatomidae", "Bostrichidae", "Ptinidae", "Lymexylidae",
    "Phloiophilidae", "Trogossitidae", "Thanerocleridae", "Cleridae",
    "Acanthocnemidae", "Melyridae", "Malachiidae", "Sphindidae", "Nitidulidae",
    "Monotomidae", "Phloeostichidae", "Silvanidae", "Cucujidae",
    "Laemophloeidae", "Cryptophagidae", "Erotylidae", "Biphyllidae",
    "Bothrideridae", "Cerylonidae", "Alexiidae", "Endomychidae",
    "Corylophidae", "Latridiidae", "Mycetophagidae", "Ciidae", "Tetratomidae",
    "Melandryidae", "Zopheridae", "Mordellidae", "Tenebrionidae",
    "Prostomidae", "Oedemeridae", "Pythidae", "Pyrochroidae", "Salpingidae",
    "Aderidae", "Scraptiidae", "Cerambycidae", "Chrysomelidae", "Anthribidae",
    "Brentidae", "Dryophthoridae", "Curculionidae",
  ],
);

pub const ORTHOPTERE: TaxonGroup = group(
  "Orthoptere",
  Kingdom::Animalia,
  &[],
  &["Arthropodes"],
  &["Insectes"],
  &["Orthoptères"],
  &[
    "Acrididae",
    "Gryllidae",
    "Gryllotalpidae",
    "Mogoplistidae",
    "Myrmecophilidae",
    "Pamphagidae",
    "Phalangopsidae",
    "Pyrgomorphidae",
    "Rhaphidophoridae",
    "Tetrigidae",
    "Tettigoniidae",
    "Tridactylidae",
    "Trigonidiidae",
  ],
);

pub const EPHEMERE: TaxonGroup = group(
  "Ephemere",
  Kingdom::Animalia,
  &["Ephemeroptera"],
  &["Arthropodes"],
  &["Insectes"],
  &["Autres"],
  &[],
);

pub const ARAIGNEE: TaxonGroup = group(
  "Araignee",
  Kingdom::Animalia,
  &[],
  &["Arthropodes"],
  &["Arachnides"],
  &["Araignées", "Opilions", "Pseudoscorpions", "Scorpions"],
  &[],
);

pub const MOLLUSQUE: TaxonGroup =
  group("Mollusque", Kingdom::Animalia, &[], &["Mollusques"], &[], &[], &[]);

pub const CRUSTACE: TaxonGroup = group(
  "Crustace",
  Kingdom::Animalia,
  &[],
  &["Arthropodes"],
  &["Crustacés"],
  &[],
  &[],
);

pub const POISSON: TaxonGroup = group(
  "Poisson",
  Kingdom::Animalia,
  &[],
  &["Chordés"],
  &["Poissons"],
  &[],
  &[],
);

/// Every group, in display order.
pub const TAXON_GROUPS: &[TaxonGroup] = &[
  FLORE, FONGE, AMPHIBIEN, REPTILE, AVIFAUNE, MAMMIFERE, CHIROPTERE, LEPIDOPTERE, ODONATE,
  COLEOPTERE, ORTHOPTERE, EPHEMERE, ARAIGNEE, MOLLUSQUE, CRUSTACE, POISSON,
];

pub fn find(title: &str) -> Option<&'static TaxonGroup> {
  TAXON_GROUPS.iter().find(|g| g.title == title)
}

/// Resolve titles to catalog entries, in catalog order.
pub fn from_titles<S: AsRef<str>>(titles: &[S]) -> Result<Vec<&'static TaxonGroup>> {
  if let Some(unknown) = titles.iter().find(|t| find(t.as_ref()).is_none()) {
    return Err(Error::UnknownTaxonGroup(unknown.as_ref().to_owned()));
  }
  Ok(
    TAXON_GROUPS
      .iter()
      .filter(|g| titles.iter().any(|t| t.as_ref() == g.title))
      .collect(),
  )
}

/// Groups whose table `<prefix> <title>` appears in `tables`.
pub fn present_in<S: AsRef<str>>(tables: &[S], prefix: &str) -> Vec<&'static TaxonGroup> {
  TAXON_GROUPS
    .iter()
    .filter(|g| {
      let name = format!("{prefix} {}", g.title);
      tables.iter().any(|t| t.as_ref() == name)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record<'a>(group2: &'a str, group3: &'a str, family: &'a str) -> ReferenceRecord<'a> {
    ReferenceRecord {
      kingdom: "Animalia",
      group1: "Arthropodes",
      group2,
      group3,
      order: "Lepidoptera",
      family,
      presence: "P",
      cd_nom: "54000",
      cd_ref: "54000",
    }
  }

  #[test]
  fn catalog_titles_are_unique() {
    for (i, g) in TAXON_GROUPS.iter().enumerate() {
      assert!(TAXON_GROUPS[i + 1..].iter().all(|o| o.title != g.title), "{}", g.title);
    }
    assert_eq!(TAXON_GROUPS.len(), 16);
  }

  #[test]
  fn family_filter_applies_below_group3() {
    assert!(LEPIDOPTERE.matches(&record("Insectes", "Lépidoptères", "Pieridae"), false));
    assert!(!LEPIDOPTERE.matches(&record("Insectes", "Lépidoptères", "Noctuidae"), false));
  }

  #[test]
  fn empty_group2_short_circuits_narrower_levels() {
    let mut r = record("Gastéropodes", "Autres", "Helicidae");
    r.group1 = "Mollusques";
    assert!(MOLLUSQUE.matches(&r, false));
  }

  #[test]
  fn synonyms_are_excluded_unless_requested() {
    let mut r = record("Insectes", "Odonates", "Aeshnidae");
    r.cd_nom = "1";
    assert!(!ODONATE.matches(&r, false));
    assert!(ODONATE.matches(&r, true));
  }

  #[test]
  fn absent_taxa_are_excluded() {
    let mut r = record("Insectes", "Odonates", "Aeshnidae");
    r.presence = "A";
    assert!(!ODONATE.matches(&r, false));
  }

  #[test]
  fn order_filter_separates_bats_from_other_mammals() {
    let mut r = record("Mammifères", "Autres", "Vespertilionidae");
    r.group1 = "Chordés";
    r.order = "Chiroptera";
    assert!(CHIROPTERE.matches(&r, false));
    assert!(!MAMMIFERE.matches(&r, false));
  }

  #[test]
  fn from_titles_rejects_unknown_titles() {
    assert!(matches!(from_titles(&["Flore", "Dragons"]), Err(Error::UnknownTaxonGroup(t)) if t == "Dragons"));
    let groups = from_titles(&["Poisson", "Flore"]).unwrap();
    assert_eq!(groups[0].title, "Flore");
  }

  #[test]
  fn present_in_reads_table_prefixes() {
    let tables = ["Liste Flore", "Statuts Flore", "Liste Avifaune", "Source"];
    let titles: Vec<_> = present_in(&tables, "Liste").iter().map(|g| g.title).collect();
    assert_eq!(titles, ["Flore", "Avifaune"]);
  }
}
