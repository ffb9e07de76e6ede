//! `taxref-sync`: keep the local TAXREF lists and statuses in step with
//! the registry.
//!
//! # Usage
//!
//! ```text
//! taxref-sync check
//! taxref-sync update
//! taxref-sync update --status-only --status LRR --status PR --export exports/
//! taxref-sync --config /etc/taxref.toml update --full --group Flore
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Datelike as _;
use clap::{Parser, Subcommand};
use taxref_core::{
  registry::Registry as _,
  status::{self, StatusType},
  taxon::{self, TaxonGroup},
};
use taxref_sync::{
  RegistryClient, Stores, SyncConfig, UpdateMode, UpdatePlan, UpdateReport, Updater,
  progress::TracingReporter,
  reconcile::{self, Decision},
};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "TAXREF status synchronization")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "taxref.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Report whether the local data needs refreshing.
  Check,
  /// Refresh what the reconciliation asks for, or what is forced.
  Update {
    /// Re-import the reference lists and refresh every status.
    #[arg(long, conflicts_with = "status_only")]
    full:        bool,
    /// Refresh statuses without re-importing the reference lists.
    #[arg(long)]
    status_only: bool,
    /// Status type id to refresh (repeatable).
    #[arg(long = "status", value_name = "ID")]
    statuses:    Vec<String>,
    /// Taxon group title to refresh (repeatable).
    #[arg(long = "group", value_name = "TITLE")]
    groups:      Vec<String>,
    /// Write per-location CSV exports to this folder.
    #[arg(long, value_name = "DIR")]
    export:      Option<PathBuf>,
  },
  /// Append newly published sources to the sources table.
  Sources,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut config = SyncConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

  let client = RegistryClient::new(&config).context("failed to build HTTP client")?;
  let stores = Stores::open(&config)
    .await
    .with_context(|| format!("failed to open stores in {}", config.data_dir.display()))?;
  let reporter = TracingReporter;
  let work_dir = config.work_dir.clone();
  let updater = Updater {
    stores:   &stores,
    registry: &client,
    reporter: &reporter,
    work_dir: &work_dir,
    year:     chrono::Local::now().year(),
  };

  match cli.command {
    Command::Check => {
      let groups = resolve_groups(&config, &stores).await?;
      let reconciliation = updater.reconcile(&groups).await.context("reconciliation failed")?;
      println!(
        "local version: {}, remote version: {}, groups consistent: {}",
        reconciliation
          .local_version
          .map_or_else(|| "none".to_owned(), |v| v.to_string()),
        reconciliation.remote_version,
        reconciliation.consistent,
      );
      match reconciliation.decision {
        Decision::UpToDate => println!("up to date"),
        Decision::Full => println!("full refresh required"),
        Decision::StatusOnly => {
          println!("status refresh offered: {} new source(s)", reconciliation.new_sources.len());
          for source in &reconciliation.new_sources {
            println!("  {} {}", source.id, source.full_citation);
          }
        }
      }
    }

    Command::Update { full, status_only, statuses, groups, export } => {
      if !statuses.is_empty() {
        config.status_types = statuses;
      }
      if !groups.is_empty() {
        config.groups = groups;
      }
      if export.is_some() {
        config.export_dir = export;
      }
      let groups = resolve_groups(&config, &stores).await?;
      let status_types = resolve_statuses(&config)?;

      let mut plan = if full || status_only {
        let remote_version = client
          .current_version()
          .await
          .context("failed to read the current version")?;
        let new_sources = reconcile::check_sources(&stores, &client, updater.year).await?;
        UpdatePlan {
          mode: if full { UpdateMode::Full } else { UpdateMode::StatusOnly },
          groups,
          status_types,
          export_dir: None,
          new_sources,
          remote_version,
          include_synonyms: false,
        }
      } else {
        let reconciliation = updater.reconcile(&groups).await.context("reconciliation failed")?;
        match UpdatePlan::from_reconciliation(&reconciliation, groups, status_types) {
          Some(plan) => plan,
          None => {
            println!("up to date");
            return Ok(());
          }
        }
      };
      plan.export_dir = config.export_dir.clone();
      plan.include_synonyms = config.include_synonyms;

      let report = run_cancellable(&updater, &plan).await?;
      print_report(&report);
    }

    Command::Sources => {
      let new_sources = reconcile::check_sources(&stores, &client, updater.year).await?;
      let plan = UpdatePlan {
        mode: UpdateMode::SourcesOnly,
        groups: Vec::new(),
        status_types: Vec::new(),
        export_dir: None,
        new_sources,
        remote_version: 0,
        include_synonyms: false,
      };
      let report = run_cancellable(&updater, &plan).await?;
      print_report(&report);
    }
  }

  Ok(())
}

/// Run `plan`, cancelling on Ctrl-C.
async fn run_cancellable(
  updater: &Updater<'_, taxref_store_sqlite::SqliteStore, RegistryClient, TracingReporter>,
  plan: &UpdatePlan,
) -> anyhow::Result<UpdateReport> {
  let cancel = CancellationToken::new();
  let on_signal = cancel.clone();
  let watcher = tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_signal.cancel();
    }
  });
  let result = updater.run(plan, &cancel).await;
  watcher.abort();
  result.context("update failed")
}

async fn resolve_groups(
  config: &SyncConfig,
  stores: &Stores<taxref_store_sqlite::SqliteStore>,
) -> anyhow::Result<Vec<&'static TaxonGroup>> {
  if config.groups.is_empty() {
    Ok(stores.local_groups().await?)
  } else {
    Ok(taxon::from_titles(&config.groups)?)
  }
}

fn resolve_statuses(config: &SyncConfig) -> anyhow::Result<Vec<&'static StatusType>> {
  if config.status_types.is_empty() {
    Ok(status::STATUS_TYPES.iter().collect())
  } else {
    Ok(status::from_ids(&config.status_types)?)
  }
}

fn print_report(report: &UpdateReport) {
  if report.cancelled {
    println!("cancelled");
    return;
  }
  if report.imported_groups > 0 {
    println!("reference lists imported: {}", report.imported_groups);
  }
  println!("statuses downloaded: {}", report.downloaded.join(", "));
  if !report.not_offered.is_empty() {
    println!("not offered by the registry: {}", report.not_offered.join(", "));
  }
  for (type_id, error) in &report.failed_statuses {
    println!("status {type_id} failed: {error}");
  }
  println!("tables saved: {}", report.save.saved.join(", "));
  for (group, error) in &report.save.failed {
    println!("group {group} not saved: {error}");
  }
  if let Some(count) = report.sources {
    println!("sources stored: {count}");
  }
}
