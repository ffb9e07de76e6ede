//! The `Registry` trait: the remote TAXREF registry as the engine sees it.
//!
//! Implemented over HTTP by `taxref-sync`; tests substitute an in-memory
//! fake.

use std::future::Future;

use crate::record::{Source, StatusPage};

/// Records per status page.
pub const PAGE_SIZE: u32 = 10_000;

/// Read-only access to the remote registry.
///
/// All methods return `Send` futures so a registry can be shared across
/// tasks on a multi-threaded runtime.
pub trait Registry: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Identifier of the current reference dataset version.
  fn current_version(&self) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Download URL of the checklist archive for `version` (at least 1).
  fn download_url(
    &self,
    version: i64,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  /// Ids of every status type the registry currently offers.
  fn status_types(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// One page of records for a status type. Pages are 1-based.
  fn status_page<'a>(
    &'a self,
    type_id: &'a str,
    page: u32,
  ) -> impl Future<Output = Result<StatusPage, Self::Error>> + Send + 'a;

  /// Every bibliographic source published in `year`, unfiltered.
  fn sources_for_year(
    &self,
    year: i32,
  ) -> impl Future<Output = Result<Vec<Source>, Self::Error>> + Send + '_;
}
