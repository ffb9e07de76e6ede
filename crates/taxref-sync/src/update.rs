//! Update orchestration: run the steps of a plan in order, with progress
//! and cancellation.
//!
//! A full update re-imports the reference lists before refreshing every
//! status; a status-only update skips the import. Both end with the merge
//! barrier and the sources table. Cancellation is observed between steps,
//! between pages and between archive chunks; whatever intermediates exist
//! at that point are deleted and nothing is merged.

use std::path::{Path, PathBuf};

use taxref_core::{
  record::Source,
  registry::Registry,
  status::{AvailabilityMap, StatusType},
  store::TableStore,
  taxon::TaxonGroup,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
  Error, Result,
  import::{self, ArchiveSource},
  pipeline::{self, Intermediate, StatusPipeline, StatusRun},
  progress::{self, ProgressReporter, UpdateEvent},
  reconcile::{self, Decision, Reconciliation},
  save::{self, SaveReport},
  stores::Stores,
};

// ─── Plan ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
  Full,
  StatusOnly,
  SourcesOnly,
}

impl UpdateMode {
  pub fn steps(self) -> usize {
    match self {
      UpdateMode::Full => 6,
      UpdateMode::StatusOnly => 3,
      UpdateMode::SourcesOnly => 1,
    }
  }
}

#[derive(Debug, Clone)]
pub struct UpdatePlan {
  pub mode:             UpdateMode,
  pub groups:           Vec<&'static TaxonGroup>,
  pub status_types:     Vec<&'static StatusType>,
  pub export_dir:       Option<PathBuf>,
  /// Sources to append when the version is unchanged.
  pub new_sources:      Vec<Source>,
  pub remote_version:   i64,
  pub include_synonyms: bool,
}

impl UpdatePlan {
  /// The plan a reconciliation calls for, or `None` when up to date.
  pub fn from_reconciliation(
    reconciliation: &Reconciliation,
    groups: Vec<&'static TaxonGroup>,
    status_types: Vec<&'static StatusType>,
  ) -> Option<Self> {
    let mode = match reconciliation.decision {
      Decision::UpToDate => return None,
      Decision::Full => UpdateMode::Full,
      Decision::StatusOnly => UpdateMode::StatusOnly,
    };
    Some(Self {
      mode,
      groups,
      status_types,
      export_dir: None,
      new_sources: reconciliation.new_sources.clone(),
      remote_version: reconciliation.remote_version,
      include_synonyms: false,
    })
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateReport {
  pub cancelled:       bool,
  pub imported_groups: usize,
  /// Status types whose intermediates were written.
  pub downloaded:      Vec<&'static str>,
  /// Status types the registry does not offer.
  pub not_offered:     Vec<&'static str>,
  pub failed_statuses: Vec<(&'static str, String)>,
  pub save:            SaveReport,
  /// Number of stored sources, when that step ran.
  pub sources:         Option<usize>,
}

// ─── Updater ─────────────────────────────────────────────────────────────────

/// Runs update plans against a pair of stores and a registry.
pub struct Updater<'a, S, R, P> {
  pub stores:   &'a Stores<S>,
  pub registry: &'a R,
  pub reporter: &'a P,
  pub work_dir: &'a Path,
  /// Calendar year the source lookups start from.
  pub year:     i32,
}

impl<S, R, P> Updater<'_, S, R, P>
where
  S: TableStore,
  R: Registry + ArchiveSource,
  P: ProgressReporter,
{
  /// Reconcile the local stores against the registry for `groups`.
  pub async fn reconcile(&self, groups: &[&'static TaxonGroup]) -> Result<Reconciliation> {
    reconcile::reconcile(self.stores, self.registry, groups, self.year).await
  }

  pub async fn run(&self, plan: &UpdatePlan, cancel: &CancellationToken) -> Result<UpdateReport> {
    tokio::fs::create_dir_all(self.work_dir).await?;
    let total = plan.mode.steps();
    let mut step = 0;
    let mut report = UpdateReport::default();
    info!(
      mode = ?plan.mode,
      groups = plan.groups.len(),
      statuses = plan.status_types.len(),
      "update started"
    );

    if plan.mode == UpdateMode::Full {
      step += 1;
      self.step(step, total, "Resolving archive URL");
      let url = self
        .registry
        .download_url(plan.remote_version)
        .await
        .map_err(Error::registry)?;
      if cancel.is_cancelled() {
        return Ok(self.cancelled(report, &[]).await);
      }

      step += 1;
      self.step(step, total, "Downloading reference archive");
      let archive = import::archive_path(self.work_dir, plan.remote_version);
      let on_progress = |percent: u8| self.reporter.report(UpdateEvent::StepProgress { percent });
      if !self
        .registry
        .fetch_archive(&url, &archive, cancel, &on_progress)
        .await?
      {
        return Ok(self.cancelled(report, &[]).await);
      }

      step += 1;
      self.step(step, total, "Importing reference lists");
      report.imported_groups = import::import_reference(
        self.stores,
        &archive,
        plan.remote_version,
        &plan.groups,
        plan.include_synonyms,
      )
      .await?;
      if cancel.is_cancelled() {
        return Ok(self.cancelled(report, &[]).await);
      }
    }

    if plan.mode != UpdateMode::SourcesOnly {
      step += 1;
      self.step(step, total, "Downloading statuses");
      let Some(written) = self.download_statuses(plan, cancel, &mut report).await? else {
        return Ok(report);
      };

      step += 1;
      self.step(step, total, "Merging and saving statuses");
      report.save = save::merge_and_save(&self.stores.status, &written).await;
      pipeline::discard(&written).await;
      if cancel.is_cancelled() {
        return Ok(self.cancelled(report, &[]).await);
      }
    }

    step += 1;
    self.step(step, total, "Saving sources");
    report.sources = Some(
      reconcile::save_sources(
        self.stores,
        self.registry,
        plan.mode == UpdateMode::Full,
        &plan.new_sources,
        self.year,
      )
      .await?,
    );

    self.reporter.report(UpdateEvent::Finished);
    info!(
      downloaded = report.downloaded.len(),
      failed = report.failed_statuses.len(),
      saved = report.save.saved.len(),
      "update finished"
    );
    Ok(report)
  }

  /// Run the pipeline for every status type. `None` when cancelled, in
  /// which case `report` is already marked and the intermediates gone.
  async fn download_statuses(
    &self,
    plan: &UpdatePlan,
    cancel: &CancellationToken,
    report: &mut UpdateReport,
  ) -> Result<Option<Vec<Intermediate>>> {
    let offered = self
      .registry
      .status_types()
      .await
      .map_err(Error::registry)?;
    let availability = AvailabilityMap::new(offered);
    let references = self.stores.references(&plan.groups).await?;
    let pipeline = StatusPipeline {
      registry:     self.registry,
      references:   &references,
      availability: &availability,
      work_dir:     self.work_dir,
      export_dir:   plan.export_dir.as_deref(),
      cancel,
    };

    let mut written = Vec::new();
    let count = plan.status_types.len() as u64;
    for (done, &status) in plan.status_types.iter().enumerate() {
      if cancel.is_cancelled() {
        *report = self.cancelled(std::mem::take(report), &written).await;
        return Ok(None);
      }
      match pipeline.run(status).await {
        Ok(StatusRun::NotOffered) => report.not_offered.push(status.type_id),
        Ok(StatusRun::Cancelled) => {
          *report = self.cancelled(std::mem::take(report), &written).await;
          return Ok(None);
        }
        Ok(StatusRun::Written(intermediates)) => {
          written.extend(intermediates);
          report.downloaded.push(status.type_id);
          self
            .reporter
            .report(UpdateEvent::StatusDownloaded { type_id: status.type_id });
        }
        Err(e) => {
          warn!(type_id = status.type_id, error = %e, "status download failed; skipped");
          report.failed_statuses.push((status.type_id, e.to_string()));
        }
      }
      self.reporter.report(UpdateEvent::StepProgress {
        percent: progress::percent(done as u64 + 1, count),
      });
    }
    Ok(Some(written))
  }

  fn step(&self, index: usize, total: usize, label: &str) {
    self
      .reporter
      .report(UpdateEvent::StepStarted { index, total, label });
  }

  async fn cancelled(&self, mut report: UpdateReport, written: &[Intermediate]) -> UpdateReport {
    pipeline::discard(written).await;
    report.cancelled = true;
    self.reporter.report(UpdateEvent::Cancelled);
    info!("update cancelled");
    report
  }
}
