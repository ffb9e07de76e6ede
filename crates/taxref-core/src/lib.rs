//! Core types and trait definitions for the TAXREF status engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Catalogs, the in-memory [`Table`](table::Table), status extraction,
//! aggregation and merge logic live here; `taxref-store-sqlite` and
//! `taxref-sync` provide the I/O around them.

pub mod aggregate;
pub mod error;
pub mod extract;
pub mod merge;
pub mod record;
pub mod reference;
pub mod region;
pub mod registry;
pub mod source;
pub mod status;
pub mod store;
pub mod table;
pub mod taxon;

pub use error::{Error, Result};
pub use table::{Table, Value};
