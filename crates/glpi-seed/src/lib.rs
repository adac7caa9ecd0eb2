//! GLPI seeding pipelines.
//!
//! Two independent generators that populate a GLPI database with synthetic,
//! schema-valid records:
//!
//! ```text
//!   catalog ──► incident generator ──► glpi_tickets
//!                                          │  (random sample, type = 1)
//!                                          ▼
//!   catalog ──► change generator ──► glpi_changes + glpi_changes_tickets
//!                                    (one transaction per batch)
//! ```
//!
//! Output is randomized on purpose: re-running a generator yields different
//! rows every time. Callers (and tests) should check ranges and invariants,
//! never exact values.

pub mod catalog;
pub mod change;
pub mod config;
pub mod incident;
pub mod pipeline;
pub mod store;
pub mod vocab;

pub use change::{generate_change, Change, IncidentRef};
pub use config::{ConfigError, DbConfig};
pub use incident::{generate_incidents, Incident};
pub use pipeline::{
    run_change_generation, run_incident_generation, ChangeRunReport, ChangeRunSettings,
    PipelineError,
};
pub use store::{Dialect, SeedStore, StoreError};
pub use vocab::{ChangeStatus, GlobalValidation, Level, TicketStatus};

use chrono::{NaiveDateTime, Timelike};

/// Column format GLPI uses for `DATETIME` values.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Wall-clock "now" in local time, truncated to whole seconds.
pub fn local_now() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
