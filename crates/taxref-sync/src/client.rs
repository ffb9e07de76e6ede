//! [`RegistryClient`]: the TAXREF web API over HTTP.

use std::time::Duration;

use reqwest::{Client, Response};
use taxref_core::{
  Error as CoreError,
  record::{self, Source, SourcePage, StatusPage},
  registry::{PAGE_SIZE, Registry},
};
use tracing::debug;

use crate::{Error, Result, config::SyncConfig};

/// Async client for the registry endpoints.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct RegistryClient {
  client:        Client,
  api_base:      String,
  versions_url:  String,
  download_base: String,
}

impl RegistryClient {
  pub fn new(config: &SyncConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(config.user_agent.as_str())
      .build()?;
    Ok(Self {
      client,
      api_base: config.api_base.trim_end_matches('/').to_owned(),
      versions_url: config.versions_url.clone(),
      download_base: config.download_base.trim_end_matches('/').to_owned(),
    })
  }

  fn api(&self, path: &str) -> String { format!("{}{}", self.api_base, path) }

  /// `GET url`, failing on any non-success status.
  pub async fn get(&self, url: &str) -> Result<Response> {
    debug!(url, "GET");
    let resp = self.client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
      return Err(Error::HttpStatus {
        url: url.to_owned(),
        status,
      });
    }
    Ok(resp)
  }

  async fn get_text(&self, url: &str) -> Result<String> { Ok(self.get(url).await?.text().await?) }

  async fn sources_page(&self, year: i32, page: Option<u32>) -> Result<SourcePage> {
    let mut url = self.api(&format!("/sources/findByTerm/{year}"));
    if let Some(page) = page {
      url.push_str(&format!("?page={page}"));
    }
    let body = self.get_text(&url).await?;
    Ok(serde_json::from_str(&body).map_err(CoreError::from)?)
  }
}

impl Registry for RegistryClient {
  type Error = Error;

  async fn current_version(&self) -> Result<i64> {
    let body = self.get_text(&self.api("/taxrefVersions/current")).await?;
    record::parse_current_version(&body)?.ok_or(Error::NoCurrentVersion)
  }

  async fn download_url(&self, version: i64) -> Result<String> {
    if version < 1 {
      return Err(CoreError::InvalidVersion(version).into());
    }
    let body = self.get_text(&self.versions_url).await?;
    let codes = record::parse_archive_codes(&body)?;
    let code = usize::try_from(version - 1)
      .ok()
      .and_then(|i| codes.into_iter().nth(i))
      .flatten()
      .ok_or(CoreError::VersionNotFound(version))?;
    Ok(format!("{}/{}", self.download_base, code))
  }

  async fn status_types(&self) -> Result<Vec<String>> {
    let body = self.get_text(&self.api("/status/types")).await?;
    Ok(record::parse_status_types(&body)?)
  }

  async fn status_page(&self, type_id: &str, page: u32) -> Result<StatusPage> {
    let url = self.api(&format!("/status/findByType/{type_id}?page={page}&size={PAGE_SIZE}"));
    let body = self.get_text(&url).await?;
    Ok(serde_json::from_str(&body).map_err(CoreError::from)?)
  }

  async fn sources_for_year(&self, year: i32) -> Result<Vec<Source>> {
    let first = self.sources_page(year, None).await?;
    let mut sources = first.sources;
    for page in 2..=first.total_pages {
      sources.extend(self.sources_page(year, Some(page)).await?.sources);
    }
    debug!(year, count = sources.len(), "fetched sources");
    Ok(sources)
  }
}
