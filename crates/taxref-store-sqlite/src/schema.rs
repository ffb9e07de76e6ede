//! Connection setup for the SQLite table store.
//!
//! The container has no fixed schema: every table is created on write with
//! the columns of the table being written. Only connection pragmas run at
//! startup, and `PRAGMA user_version` marks the container layout.

/// Executed once per connection.
pub const SCHEMA: &str = "
PRAGMA busy_timeout = 5000;
PRAGMA synchronous  = NORMAL;

PRAGMA user_version = 1;
";
