//! Runtime configuration.
//!
//! Values come from an optional TOML file overlaid by `TAXREF_*`
//! environment variables; every field has a default so an empty
//! configuration is valid.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

pub const REFERENCE_STORE_FILE: &str = "donnees.sqlite";
pub const STATUS_STORE_FILE: &str = "statuts.sqlite";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  /// Directory holding the reference and status stores.
  pub data_dir:         PathBuf,
  /// Scratch directory for the archive and intermediate tables.
  pub work_dir:         PathBuf,
  pub api_base:         String,
  pub versions_url:     String,
  pub download_base:    String,
  pub timeout_secs:     u64,
  pub user_agent:       String,
  /// Keep synonym rows when importing the reference checklist.
  pub include_synonyms: bool,
  /// Taxon group titles to refresh. Empty means the local groups.
  pub groups:           Vec<String>,
  /// Status type ids to refresh. Empty means every catalog type.
  pub status_types:     Vec<String>,
  /// Folder for the per-location CSV exports, if any.
  pub export_dir:       Option<PathBuf>,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      data_dir:         PathBuf::from("data"),
      work_dir:         PathBuf::from("data/tmp"),
      api_base:         "https://taxref.mnhn.fr/api".to_owned(),
      versions_url:     "https://taxref.mnhn.fr/taxref-web/versions/listAllVersions".to_owned(),
      download_base:    "https://inpn.mnhn.fr/docs-web/docs/download".to_owned(),
      timeout_secs:     120,
      user_agent:       concat!("taxref-sync/", env!("CARGO_PKG_VERSION")).to_owned(),
      include_synonyms: false,
      groups:           Vec::new(),
      status_types:     Vec::new(),
      export_dir:       None,
    }
  }
}

impl SyncConfig {
  /// Load from `path` (missing file is fine) and the environment.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("TAXREF")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("groups")
          .with_list_parse_key("status_types"),
      )
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn reference_store_path(&self) -> PathBuf { self.data_dir.join(REFERENCE_STORE_FILE) }

  pub fn status_store_path(&self) -> PathBuf { self.data_dir.join(STATUS_STORE_FILE) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = SyncConfig::load(Path::new("/nonexistent/taxref.toml")).unwrap();
    assert_eq!(cfg.api_base, "https://taxref.mnhn.fr/api");
    assert_eq!(cfg.reference_store_path(), Path::new("data/donnees.sqlite"));
    assert!(cfg.export_dir.is_none());
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taxref.toml");
    std::fs::write(
      &path,
      "data_dir = \"/srv/taxref\"\ngroups = [\"Flore\", \"Avifaune\"]\ntimeout_secs = 30\n",
    )
    .unwrap();

    let cfg = SyncConfig::load(&path).unwrap();
    assert_eq!(cfg.status_store_path(), Path::new("/srv/taxref/statuts.sqlite"));
    assert_eq!(cfg.groups, ["Flore", "Avifaune"]);
    assert_eq!(cfg.timeout_secs, 30);
    assert_eq!(cfg.work_dir, Path::new("data/tmp"));
  }
}
