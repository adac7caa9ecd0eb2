//! End-to-end seeding runs.
//!
//! `run_change_generation` drives the batch loop: fetch an incident sample,
//! synthesize `batch_size` changes, commit or roll back the batch, move on.
//! Per-batch failures are logged and counted; only an empty initial sample
//! aborts the run.

use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use rand::Rng;
use tracing::{info, warn};

use crate::change::{generate_change, Change, IncidentRef};
use crate::incident::generate_incidents;
use crate::store::{SeedStore, StoreError};

pub const DEFAULT_INCIDENT_COUNT: usize = 1000;
pub const DEFAULT_TOTAL_CHANGES: usize = 6000;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_FETCH_LIMIT: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("batch size must be > 0")]
    InvalidBatchSize,
    #[error("no incidents found to correlate with changes")]
    NoIncidents,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRunSettings {
    pub total: usize,
    pub batch_size: usize,
    pub fetch_limit: u32,
    /// Draw a fresh incident sample for every batch after the first.
    pub resample_each_batch: bool,
}

impl Default for ChangeRunSettings {
    fn default() -> Self {
        Self {
            total: DEFAULT_TOTAL_CHANGES,
            batch_size: DEFAULT_BATCH_SIZE,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            resample_each_batch: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRunReport {
    pub requested: usize,
    pub inserted: u64,
    pub batches: usize,
    pub failed_batches: usize,
    pub elapsed: Duration,
}

impl ChangeRunReport {
    pub fn changes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.inserted as f64 / secs
        } else {
            0.0
        }
    }
}

/// Generate `count` incidents and insert them in one transaction.
pub async fn run_incident_generation<R: Rng + ?Sized>(
    store: &mut SeedStore,
    rng: &mut R,
    count: usize,
    now: NaiveDateTime,
) -> Result<u64, StoreError> {
    let incidents = generate_incidents(rng, count, now);
    let inserted = store.insert_incidents(&incidents).await?;
    info!(inserted, "incidents inserted");
    Ok(inserted)
}

pub async fn run_change_generation<R: Rng + ?Sized>(
    store: &mut SeedStore,
    rng: &mut R,
    settings: &ChangeRunSettings,
    now: NaiveDateTime,
) -> Result<ChangeRunReport, PipelineError> {
    if settings.batch_size == 0 {
        return Err(PipelineError::InvalidBatchSize);
    }
    let started = Instant::now();
    info!(total = settings.total, "starting change generation");

    let mut sample = store.fetch_incidents(settings.fetch_limit).await?;
    if sample.is_empty() {
        return Err(PipelineError::NoIncidents);
    }
    info!(count = sample.len(), "found incidents for correlation");

    let mut progress = Progress::new(settings.total);
    let mut inserted = 0u64;
    let mut batches = 0usize;
    let mut failed_batches = 0usize;

    for batch_start in (0..settings.total).step_by(settings.batch_size) {
        let batch_end = (batch_start + settings.batch_size).min(settings.total);
        let is_last = batch_end == settings.total;
        batches += 1;

        if batches == 1 || is_last || progress.crosses(batch_start) {
            info!(
                "generating batch {}-{} of {} changes ({:.1}%)",
                batch_start + 1,
                batch_end,
                settings.total,
                progress.percent(batch_start as u64),
            );
        }

        let have_sample = if settings.resample_each_batch && batch_start > 0 {
            refresh_sample(store, settings.fetch_limit, &mut sample, batches).await
        } else {
            true
        };

        if have_sample {
            let changes = build_batch(rng, &sample, batch_end - batch_start, now);
            match store.insert_change_batch(&changes).await {
                Ok(n) => inserted += n,
                Err(e) => {
                    warn!(batch = batches, error = %e, "batch rolled back");
                    failed_batches += 1;
                }
            }
        } else {
            failed_batches += 1;
        }

        if is_last || progress.crosses_inserted(inserted) {
            info!(
                "progress: {}/{} changes inserted ({:.1}%)",
                inserted,
                settings.total,
                progress.percent(inserted),
            );
        }
    }

    let report = ChangeRunReport {
        requested: settings.total,
        inserted,
        batches,
        failed_batches,
        elapsed: started.elapsed(),
    };
    info!(
        "change generation complete: {}/{} changes in {:.2} seconds ({:.2} changes/sec)",
        report.inserted,
        report.requested,
        report.elapsed.as_secs_f64(),
        report.changes_per_sec(),
    );
    Ok(report)
}

/// Replace `sample` with a fresh draw. Returns `false` when the batch must
/// be skipped.
async fn refresh_sample(
    store: &mut SeedStore,
    fetch_limit: u32,
    sample: &mut Vec<IncidentRef>,
    batch: usize,
) -> bool {
    match store.fetch_incidents(fetch_limit).await {
        Ok(fresh) if !fresh.is_empty() => {
            *sample = fresh;
            true
        }
        Ok(_) => {
            warn!(batch, "incident re-sample came back empty; skipping batch");
            false
        }
        Err(e) => {
            warn!(batch, error = %e, "incident re-sample failed; skipping batch");
            false
        }
    }
}

fn build_batch<R: Rng + ?Sized>(
    rng: &mut R,
    sample: &[IncidentRef],
    size: usize,
    now: NaiveDateTime,
) -> Vec<Change> {
    (0..size)
        .filter_map(|_| generate_change(rng, sample, now))
        .collect()
}

/// Tracks which 10% milestones have already been logged.
struct Progress {
    total: usize,
    generated_decile: u64,
    inserted_decile: u64,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            total,
            generated_decile: 0,
            inserted_decile: 0,
        }
    }

    fn percent(&self, done: u64) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        done as f64 * 100.0 / self.total as f64
    }

    fn decile(&self, done: u64) -> u64 {
        if self.total == 0 {
            return 10;
        }
        done.saturating_mul(10) / self.total as u64
    }

    fn crosses(&mut self, batch_start: usize) -> bool {
        let decile = self.decile(batch_start as u64);
        let crossed = decile > self.generated_decile;
        self.generated_decile = self.generated_decile.max(decile);
        crossed
    }

    fn crosses_inserted(&mut self, inserted: u64) -> bool {
        let decile = self.decile(inserted);
        let crossed = decile > self.inserted_decile;
        self.inserted_decile = self.inserted_decile.max(decile);
        crossed
    }
}
