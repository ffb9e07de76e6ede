//! Progress reporting for update runs.
//!
//! The orchestrator never prints; it emits [`UpdateEvent`]s to a
//! [`ProgressReporter`] chosen by the caller.

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent<'a> {
  /// A new step begins. `index` is 1-based.
  StepStarted {
    index: usize,
    total: usize,
    label: &'a str,
  },
  /// Completion of the current step, 0 to 100.
  StepProgress { percent: u8 },
  /// One status type has been downloaded and its intermediates written.
  StatusDownloaded { type_id: &'a str },
  Finished,
  Cancelled,
}

pub trait ProgressReporter: Send + Sync {
  fn report(&self, event: UpdateEvent<'_>);
}

/// Logs step boundaries at `info` and progress at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
  fn report(&self, event: UpdateEvent<'_>) {
    match event {
      UpdateEvent::StepStarted { index, total, label } => info!("step {index}/{total}: {label}"),
      UpdateEvent::StepProgress { percent } => tracing::debug!(percent, "progress"),
      UpdateEvent::StatusDownloaded { type_id } => info!(type_id, "status downloaded"),
      UpdateEvent::Finished => info!("update finished"),
      UpdateEvent::Cancelled => info!("update cancelled"),
    }
  }
}

/// Integer percentage of `done` over `total`, clamped to 100.
pub(crate) fn percent(done: u64, total: u64) -> u8 {
  if total == 0 {
    return 100;
  }
  u8::try_from((done.saturating_mul(100) / total).min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percent_is_clamped() {
    assert_eq!(percent(0, 4), 0);
    assert_eq!(percent(1, 4), 25);
    assert_eq!(percent(5, 4), 100);
    assert_eq!(percent(3, 0), 100);
  }
}
