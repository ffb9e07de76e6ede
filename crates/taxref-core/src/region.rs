//! Administrative geography: levels, the historical region table and the
//! overseas exclusion list.

/// Location names that count as the whole country.
pub const FRANCE_NAMES: &[&str] = &["France", "France métropolitaine"];

/// Overseas territories whose records never reach a list.
pub const OVERSEAS: &[&str] = &["Guadeloupe", "Guyane", "Martinique", "Réunion", "Mayotte"];

pub fn is_overseas(location: &str) -> bool { OVERSEAS.contains(&location) }

// ─── AdminLevel ──────────────────────────────────────────────────────────────

/// Granularity of a location mention, as spelled in `locationAdminLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdminLevel {
  State,
  Territory,
  Region,
  FormerRegion,
  Department,
}

impl AdminLevel {
  /// Every level, in processing order.
  pub const ALL: [AdminLevel; 5] = [
    AdminLevel::State,
    AdminLevel::Territory,
    AdminLevel::Region,
    AdminLevel::FormerRegion,
    AdminLevel::Department,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      AdminLevel::State => "État",
      AdminLevel::Territory => "Territoire",
      AdminLevel::Region => "Région",
      AdminLevel::FormerRegion => "Ancienne région",
      AdminLevel::Department => "Département",
    }
  }
}

// ─── Regions ─────────────────────────────────────────────────────────────────

/// A pre-2016 region, the merged region that replaced it, and its
/// departments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalRegion {
  pub name:        &'static str,
  pub current:     &'static str,
  pub departments: &'static [&'static str],
}

impl HistoricalRegion {
  /// Every location name whose records are attributed to this region.
  pub fn location_names(&self) -> impl Iterator<Item = &'static str> + '_ {
    FRANCE_NAMES
      .iter()
      .copied()
      .chain([self.name, self.current])
      .chain(self.departments.iter().copied())
  }

  pub fn covers(&self, location: &str) -> bool { self.location_names().any(|n| n == location) }
}

const fn region(
  name: &'static str,
  current: &'static str,
  departments: &'static [&'static str],
) -> HistoricalRegion {
  HistoricalRegion {
    name,
    current,
    departments,
  }
}

pub const REGIONS: &[HistoricalRegion] = &[
  region("Auvergne", "Auvergne-Rhône-Alpes", &[
    "Allier",
    "Cantal",
    "Haute-Loire",
    "Puy-de-Dôme",
  ]),
  region("Rhône-Alpes", "Auvergne-Rhône-Alpes", &[
    "Ain",
    "Ardèche",
    "Drôme",
    "Isère",
    "Loire",
    "Rhône",
    "Savoie",
    "Haute-Savoie",
  ]),
  region("Bourgogne", "Bourgogne-Franche-Comté", &[
    "Côte-d'Or",
    "Nièvre",
    "Saône-et-Loire",
    "Yonne",
  ]),
  region("Franche-Comté", "Bourgogne-Franche-Comté", &[
    "Doubs",
    "Jura",
    "Haute-Saône",
    "Territoire de Belfort",
  ]),
  region("Bretagne", "Bretagne", &[
    "Côtes-d'Armor",
    "Finistère",
    "Ille-et-Vilaine",
    "Morbihan",
  ]),
  region("Centre", "Centre-Val de Loire", &[
    "Cher",
    "Eure-et-Loir",
    "Indre",
    "Indre-et-Loire",
    "Loir-et-Cher",
    "Loiret",
  ]),
  region("Corse", "Corse", &["Corse-du-Sud", "Haute-Corse"]),
  region("Champagne-Ardenne", "Grand-Est", &[
    "Ardennes",
    "Aube",
    "Marne",
    "Haute-Marne",
  ]),
  region("Alsace", "Grand-Est", &["Bas-Rhin", "Haut-Rhin"]),
  region("Lorraine", "Grand-Est", &[
    "Meurthe-et-Moselle",
    "Meuse",
    "Moselle",
    "Vosges",
  ]),
  region("Picardie", "Hauts-de-France", &["Aisne", "Oise", "Somme"]),
  region("Nord-Pas-de-Calais", "Hauts-de-France", &["Nord", "Pas-de-Calais"]),
  region("Ile-de-France", "Ile-de-France", &[
    "Paris",
    "Seine-et-Marne",
    "Yvelines",
    "Essonne",
    "Hauts-de-Seine",
    "Seine-Saint-Denis",
    "Val-de-Marne",
    "Val-d'Oise",
  ]),
  region("Haute-Normandie", "Normandie", &["Eure", "Seine-Maritime"]),
  region("Basse-Normandie", "Normandie", &["Calvados", "Manche", "Orne"]),
  region("Poitou-Charentes", "Nouvelle-Aquitaine", &[
    "Charente",
    "Charente-Maritime",
    "Deux-Sèvres",
    "Vienne",
  ]),
  region("Aquitaine", "Nouvelle-Aquitaine", &[
    "Dordogne",
    "Gironde",
    "Landes",
    "Lot-et-Garonne",
    "Pyrénées-Atlantiques",
  ]),
  region("Limousin", "Nouvelle-Aquitaine", &["Corrèze", "Creuse", "Haute-Vienne"]),
  region("Midi-Pyrénées", "Occitanie", &[
    "Ariège",
    "Aveyron",
    "Haute-Garonne",
    "Gers",
    "Lot",
    "Hautes-Pyrénées",
    "Tarn",
    "Tarn-et-Garonne",
  ]),
  region("Languedoc-Roussillon", "Occitanie", &[
    "Aude",
    "Gard",
    "Hérault",
    "Lozère",
    "Pyrénées-Orientales",
  ]),
  region("Pays de la Loire", "Pays de la Loire", &[
    "Loire-Atlantique",
    "Maine-et-Loire",
    "Mayenne",
    "Sarthe",
    "Vendée",
  ]),
  region("Provence-Alpes-Côte d'Azur", "Provence-Alpes-Côte-d'Azur", &[
    "Alpes-de-Haute-Provence",
    "Hautes-Alpes",
    "Alpes-Maritimes",
    "Bouches-du-Rhône",
    "Var",
    "Vaucluse",
  ]),
];

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn twenty_two_historical_regions() {
    assert_eq!(REGIONS.len(), 22);
  }

  #[test]
  fn every_department_belongs_to_one_region() {
    let mut seen = std::collections::HashSet::new();
    for r in REGIONS {
      for d in r.departments {
        assert!(seen.insert(*d), "{d} listed twice");
      }
    }
    assert_eq!(seen.len(), 96);
  }

  #[test]
  fn location_names_include_country_and_current_region() {
    let auvergne = REGIONS.iter().find(|r| r.name == "Auvergne").unwrap();
    assert!(auvergne.covers("France métropolitaine"));
    assert!(auvergne.covers("Auvergne-Rhône-Alpes"));
    assert!(auvergne.covers("Cantal"));
    assert!(!auvergne.covers("Gironde"));
  }
}
