//! TAXREF synchronization: the HTTP registry client, the status pipeline,
//! the merge barrier, version/source reconciliation and the update
//! orchestrator that sequences them.

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod pipeline;
pub mod progress;
pub mod reconcile;
pub mod save;
pub mod stores;
pub mod update;

pub use client::RegistryClient;
pub use config::SyncConfig;
pub use error::{Error, Result};
pub use stores::Stores;
pub use update::{UpdateMode, UpdatePlan, UpdateReport, Updater};
