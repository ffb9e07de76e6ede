//! Error types for `taxref-sync`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] taxref_core::Error),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("GET {url} returned {status}")]
  HttpStatus {
    url:    String,
    status: reqwest::StatusCode,
  },

  #[error("registry error: {0}")]
  Registry(#[source] BoxError),

  /// `taxrefVersions/current` answered without an `id`.
  #[error("the registry did not report a current version")]
  NoCurrentVersion,

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("archive has no entry named {0:?}")]
  ArchiveEntryMissing(String),

  #[error("background task failed: {0}")]
  Join(#[from] tokio::task::JoinError),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub(crate) fn registry(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Registry(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
