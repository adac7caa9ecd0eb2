use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use glpi_seed::{
    local_now, run_change_generation, run_incident_generation, ChangeRunSettings, DbConfig,
    SeedStore,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{DatabaseArgs, SeedChangesArgs};

fn database_url(args: &DatabaseArgs) -> Result<String> {
    if let Some(url) = args.database_url.as_deref() {
        return Ok(url.to_string());
    }
    let cfg = DbConfig::from_env().context("database configuration")?;
    Ok(cfg.database_url()?)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))
}

pub(crate) fn cmd_seed_incidents(count: usize, db: &DatabaseArgs) -> Result<()> {
    let url = database_url(db)?;
    let mut rng = StdRng::from_entropy();

    let inserted = runtime()?.block_on(async {
        let mut store = SeedStore::connect(&url).await?;
        let inserted = run_incident_generation(&mut store, &mut rng, count, local_now()).await;
        store.close().await?;
        inserted
    })?;

    println!(
        "{} inserted {} incidents",
        "ok".green().bold(),
        inserted.to_string().bold()
    );
    Ok(())
}

pub(crate) fn cmd_seed_changes(args: &SeedChangesArgs) -> Result<()> {
    let url = database_url(&args.db)?;
    let settings = ChangeRunSettings {
        total: args.total,
        batch_size: args.batch_size,
        fetch_limit: args.fetch_limit,
        resample_each_batch: args.resample_each_batch,
    };
    let mut rng = StdRng::from_entropy();

    let report = runtime()?.block_on(async {
        let mut store = SeedStore::connect(&url).await?;
        let report = run_change_generation(&mut store, &mut rng, &settings, local_now()).await;
        store.close().await?;
        report.map_err(anyhow::Error::from)
    })?;

    let label = if report.failed_batches == 0 {
        "ok".green().bold()
    } else {
        "partial".yellow().bold()
    };
    println!(
        "{} inserted {}/{} changes in {:.2}s ({:.2} changes/sec, {} of {} batches failed)",
        label,
        report.inserted.to_string().bold(),
        report.requested,
        report.elapsed.as_secs_f64(),
        report.changes_per_sec(),
        report.failed_batches,
        report.batches,
    );
    Ok(())
}
