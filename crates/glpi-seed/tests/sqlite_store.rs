//! Persistence tests against a SQLite file, through the same `sqlx::Any`
//! code path used for MySQL.

use std::io;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use glpi_seed::change::DEFAULT_ADMIN_USER_ID;
use glpi_seed::{
    generate_change, generate_incidents, run_change_generation, run_incident_generation,
    ChangeRunSettings, IncidentRef, PipelineError, SeedStore,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::any::install_default_drivers;
use sqlx::{AnyConnection, Connection};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

const SCHEMA: &[&str] = &[
    "CREATE TABLE glpi_tickets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        content TEXT,
        priority INTEGER NOT NULL,
        urgency INTEGER NOT NULL,
        impact INTEGER NOT NULL,
        status INTEGER NOT NULL,
        date_creation TEXT,
        date_mod TEXT,
        entities_id INTEGER NOT NULL DEFAULT 0,
        type INTEGER NOT NULL,
        itilcategories_id INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE glpi_changes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        content TEXT,
        entities_id INTEGER NOT NULL,
        date TEXT,
        date_mod TEXT,
        status INTEGER NOT NULL,
        priority INTEGER NOT NULL,
        urgency INTEGER NOT NULL,
        impact INTEGER NOT NULL,
        global_validation INTEGER NOT NULL,
        users_id_recipient INTEGER NOT NULL,
        users_id_lastupdater INTEGER NOT NULL
    )",
    "CREATE TABLE glpi_changes_tickets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        changes_id INTEGER NOT NULL,
        tickets_id INTEGER NOT NULL
    )",
];

struct Fixture {
    _dir: TempDir,
    url: String,
    inspect: AnyConnection,
}

impl Fixture {
    async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("glpi.db").display());
        install_default_drivers();
        let mut inspect = AnyConnection::connect(&url).await.expect("open sqlite");
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&mut inspect).await.expect("create table");
        }
        Self {
            _dir: dir,
            url,
            inspect,
        }
    }

    async fn store(&self) -> SeedStore {
        SeedStore::connect(&self.url).await.expect("connect store")
    }

    async fn exec(&mut self, sql: &str) {
        sqlx::query(sql)
            .execute(&mut self.inspect)
            .await
            .expect("execute");
    }

    async fn count(&mut self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&mut self.inspect)
            .await
            .expect("count")
    }

    async fn dangling_links(&mut self) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM glpi_changes_tickets l
             LEFT JOIN glpi_changes c ON c.id = l.changes_id
             LEFT JOIN glpi_tickets t ON t.id = l.tickets_id
             WHERE c.id IS NULL OR t.id IS NULL",
        )
        .fetch_one(&mut self.inspect)
        .await
        .expect("dangling links")
    }
}

fn now() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2025-01-10 09:00:00", glpi_seed::TIMESTAMP_FORMAT)
        .expect("valid timestamp")
}

#[tokio::test]
async fn incidents_are_inserted_and_sampled_back() {
    let mut fx = Fixture::new().await;
    let mut store = fx.store().await;
    let mut rng = StdRng::seed_from_u64(1);

    let inserted = run_incident_generation(&mut store, &mut rng, 12, now())
        .await
        .expect("insert incidents");
    assert_eq!(inserted, 12);
    assert_eq!(fx.count("glpi_tickets").await, 12);

    let sample = store.fetch_incidents(5).await.expect("fetch");
    assert_eq!(sample.len(), 5);
    for incident in &sample {
        assert!(incident.id > 0);
        assert!((1..=5).contains(&incident.priority));
        assert!(!incident.name.is_empty());
    }
}

#[tokio::test]
async fn fetch_skips_non_incident_tickets() {
    let mut fx = Fixture::new().await;
    fx.exec(
        "INSERT INTO glpi_tickets (name, content, priority, urgency, impact, status, type)
         VALUES ('printer request', '', 3, 3, 3, 1, 2)",
    )
    .await;
    let mut store = fx.store().await;
    assert!(store.fetch_incidents(10).await.expect("fetch").is_empty());
}

#[tokio::test]
async fn failed_incident_insert_leaves_no_rows() {
    let mut fx = Fixture::new().await;
    fx.exec(
        "CREATE TRIGGER reject_fourth_incident BEFORE INSERT ON glpi_tickets
         WHEN (SELECT COUNT(*) FROM glpi_tickets) >= 3
         BEGIN SELECT RAISE(ABORT, 'induced incident failure'); END",
    )
    .await;
    let mut store = fx.store().await;
    let mut rng = StdRng::seed_from_u64(2);
    let incidents = generate_incidents(&mut rng, 6, now());

    // Rows inserted earlier in the same transaction are counted by the
    // trigger, so the fourth insert fails and everything is rolled back.
    let err = store.insert_incidents(&incidents).await.unwrap_err();
    assert!(err.to_string().contains("induced incident failure"), "{err}");
    assert_eq!(fx.count("glpi_tickets").await, 0);
}

#[tokio::test]
async fn failed_batch_rolls_back_only_itself() {
    let mut fx = Fixture::new().await;
    fx.exec(
        "CREATE TRIGGER reject_poisoned_link BEFORE INSERT ON glpi_changes_tickets
         WHEN NEW.tickets_id = -1
         BEGIN SELECT RAISE(ABORT, 'induced link failure'); END",
    )
    .await;
    let mut store = fx.store().await;
    let mut rng = StdRng::seed_from_u64(3);
    run_incident_generation(&mut store, &mut rng, 5, now())
        .await
        .expect("seed incidents");
    let sample = store.fetch_incidents(100).await.expect("fetch");

    let first: Vec<_> = (0..3)
        .map(|_| generate_change(&mut rng, &sample, now()).expect("change"))
        .collect();
    let first_links: usize = first.iter().map(|c| c.related_incident_ids.len()).sum();
    assert_eq!(store.insert_change_batch(&first).await.expect("batch 1"), 3);

    let mut second: Vec<_> = (0..3)
        .map(|_| generate_change(&mut rng, &sample, now()).expect("change"))
        .collect();
    second[1].related_incident_ids.push(-1);
    assert!(store.insert_change_batch(&second).await.is_err());

    assert_eq!(fx.count("glpi_changes").await, 3);
    assert_eq!(fx.count("glpi_changes_tickets").await, first_links as i64);
    assert_eq!(fx.dangling_links().await, 0);
}

#[tokio::test]
async fn change_links_use_the_generated_change_id() {
    let mut fx = Fixture::new().await;
    // Burn id 1 so a hard-coded or defaulted id would not line up.
    fx.exec(
        "INSERT INTO glpi_changes (name, content, entities_id, status, priority, urgency,
             impact, global_validation, users_id_recipient, users_id_lastupdater)
         VALUES ('old', '', 0, 1, 3, 3, 3, 0, 2, 2)",
    )
    .await;
    fx.exec("DELETE FROM glpi_changes").await;

    let mut store = fx.store().await;
    let mut rng = StdRng::seed_from_u64(11);
    run_incident_generation(&mut store, &mut rng, 6, now())
        .await
        .expect("seed incidents");
    let sample = store.fetch_incidents(100).await.expect("fetch");
    let change = generate_change(&mut rng, &sample, now()).expect("change");

    assert_eq!(
        store.insert_change_batch(std::slice::from_ref(&change)).await.expect("batch"),
        1
    );

    let change_id = sqlx::query_scalar::<_, i64>("SELECT id FROM glpi_changes")
        .fetch_one(&mut fx.inspect)
        .await
        .expect("change id");
    assert_eq!(change_id, 2);

    let mut linked = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT tickets_id FROM glpi_changes_tickets WHERE changes_id = {change_id}"
    ))
    .fetch_all(&mut fx.inspect)
    .await
    .expect("links");
    linked.sort_unstable();
    let mut expected = change.related_incident_ids.clone();
    expected.sort_unstable();
    assert_eq!(linked, expected);
    assert_eq!(fx.dangling_links().await, 0);
}

#[tokio::test]
async fn full_run_links_every_change_to_sampled_incidents() {
    let mut fx = Fixture::new().await;
    let mut store = fx.store().await;
    let mut rng = StdRng::seed_from_u64(4);
    run_incident_generation(&mut store, &mut rng, 8, now())
        .await
        .expect("seed incidents");

    let settings = ChangeRunSettings {
        total: 25,
        batch_size: 10,
        fetch_limit: 8,
        resample_each_batch: false,
    };
    let report = run_change_generation(&mut store, &mut rng, &settings, now())
        .await
        .expect("run");

    assert_eq!(report.requested, 25);
    assert_eq!(report.inserted, 25);
    assert_eq!(report.batches, 3);
    assert_eq!(report.failed_batches, 0);
    assert_eq!(fx.count("glpi_changes").await, 25);
    assert_eq!(fx.dangling_links().await, 0);

    let orphan_changes = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM glpi_changes c
         WHERE NOT EXISTS (SELECT 1 FROM glpi_changes_tickets l WHERE l.changes_id = c.id)",
    )
    .fetch_one(&mut fx.inspect)
    .await
    .expect("orphans");
    assert_eq!(orphan_changes, 0);

    let bad_validation = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM glpi_changes WHERE global_validation <> CASE
             WHEN status IN (4, 6, 7, 8) THEN 2
             WHEN status = 3 THEN 1
             ELSE 0 END",
    )
    .fetch_one(&mut fx.inspect)
    .await
    .expect("validation check");
    assert_eq!(bad_validation, 0);

    let wrong_users = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM glpi_changes
         WHERE users_id_recipient <> {DEFAULT_ADMIN_USER_ID}
            OR users_id_lastupdater <> {DEFAULT_ADMIN_USER_ID}"
    ))
    .fetch_one(&mut fx.inspect)
    .await
    .expect("user check");
    assert_eq!(wrong_users, 0);
}

#[tokio::test]
async fn run_continues_past_failed_batches() {
    let mut fx = Fixture::new().await;
    fx.exec(
        "CREATE TRIGGER cap_changes BEFORE INSERT ON glpi_changes
         WHEN (SELECT COUNT(*) FROM glpi_changes) >= 5
         BEGIN SELECT RAISE(ABORT, 'induced change failure'); END",
    )
    .await;
    let mut store = fx.store().await;
    let mut rng = StdRng::seed_from_u64(5);
    run_incident_generation(&mut store, &mut rng, 4, now())
        .await
        .expect("seed incidents");

    let settings = ChangeRunSettings {
        total: 20,
        batch_size: 5,
        fetch_limit: 100,
        resample_each_batch: true,
    };
    let report = run_change_generation(&mut store, &mut rng, &settings, now())
        .await
        .expect("run completes despite failures");

    assert_eq!(report.batches, 4);
    assert_eq!(report.inserted, 5);
    assert_eq!(report.failed_batches, 3);
    assert_eq!(fx.count("glpi_changes").await, 5);
    assert_eq!(fx.dangling_links().await, 0);
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log lock")).to_string()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn skipped_last_batch_still_reports_progress() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut fx = Fixture::new().await;
    // After the first committed link, no incident is left to re-sample.
    fx.exec(
        "CREATE TRIGGER retire_incidents AFTER INSERT ON glpi_changes_tickets
         BEGIN UPDATE glpi_tickets SET type = 2; END",
    )
    .await;
    let mut store = fx.store().await;
    let mut rng = StdRng::seed_from_u64(12);
    run_incident_generation(&mut store, &mut rng, 6, now())
        .await
        .expect("seed incidents");

    let settings = ChangeRunSettings {
        total: 15,
        batch_size: 5,
        fetch_limit: 100,
        resample_each_batch: true,
    };
    let report = run_change_generation(&mut store, &mut rng, &settings, now())
        .await
        .expect("run");

    assert_eq!(report.batches, 3);
    assert_eq!(report.inserted, 5);
    assert_eq!(report.failed_batches, 2);

    let text = logs.text();
    assert!(text.contains("incident re-sample came back empty"), "{text}");
    // Once when batch 1 lands, once more for the skipped final batch.
    assert_eq!(
        text.matches("progress: 5/15 changes inserted").count(),
        2,
        "{text}"
    );
}

#[tokio::test]
async fn run_aborts_without_incidents() {
    let fx = Fixture::new().await;
    let mut store = fx.store().await;
    let mut rng = StdRng::seed_from_u64(6);

    let err = run_change_generation(&mut store, &mut rng, &ChangeRunSettings::default(), now())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoIncidents));
}

#[tokio::test]
async fn zero_batch_size_is_rejected() {
    let fx = Fixture::new().await;
    let mut store = fx.store().await;
    let mut rng = StdRng::seed_from_u64(7);
    let settings = ChangeRunSettings {
        batch_size: 0,
        ..ChangeRunSettings::default()
    };
    let err = run_change_generation(&mut store, &mut rng, &settings, now())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidBatchSize));
}

#[test]
fn incident_ref_is_plain_data() {
    let r = IncidentRef {
        id: 1,
        name: "Azure VM - Boot failure".to_string(),
        entities_id: 0,
        priority: 3,
    };
    assert_eq!(r.clone(), r);
}
