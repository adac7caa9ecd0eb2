//! Batched persistence over a single `sqlx::Any` connection.
//!
//! Production runs target GLPI's MySQL database; SQLite is accepted for
//! local dry runs and tests. The two differ only in a few SQL spellings,
//! captured by [`Dialect`].
//!
//! Every write path runs in one transaction: it commits when every statement
//! succeeded and rolls back otherwise, so a failed batch leaves no rows.

use sqlx::any::{install_default_drivers, AnyRow};
use sqlx::{AnyConnection, Connection, Row};
use tracing::{debug, warn};

use crate::change::{Change, IncidentRef};
use crate::format_timestamp;
use crate::incident::{Incident, INCIDENT_TYPE};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unsupported database url `{0}` (expected mysql:// or sqlite://)")]
    UnsupportedUrl(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("insert into {table} did not report a generated id")]
    MissingInsertId { table: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        let scheme = url.split_once(':').map(|(s, _)| s).unwrap_or_default();
        match scheme.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(StoreError::UnsupportedUrl(redact_url(url))),
        }
    }

    fn random_order(self) -> &'static str {
        match self {
            Dialect::MySql => "RAND()",
            Dialect::Sqlite => "RANDOM()",
        }
    }

    /// Cast an id-like column to a signed 64-bit integer; GLPI declares
    /// its ids `INT UNSIGNED`, which the `Any` driver cannot decode.
    fn signed(self, column: &str) -> String {
        match self {
            Dialect::MySql => format!("CAST({column} AS SIGNED) AS {column}"),
            Dialect::Sqlite => format!("CAST({column} AS INTEGER) AS {column}"),
        }
    }

    /// Id generated by the last insert on this connection.
    fn last_insert_id_sql(self) -> &'static str {
        match self {
            Dialect::MySql => "SELECT CAST(LAST_INSERT_ID() AS SIGNED)",
            Dialect::Sqlite => "SELECT last_insert_rowid()",
        }
    }
}

const INSERT_INCIDENT_SQL: &str = "INSERT INTO glpi_tickets \
     (name, content, priority, urgency, impact, status, \
     date_creation, date_mod, entities_id, type, itilcategories_id) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const INSERT_CHANGE_SQL: &str = "INSERT INTO glpi_changes \
     (name, content, entities_id, date, date_mod, status, \
     priority, urgency, impact, global_validation, \
     users_id_recipient, users_id_lastupdater) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const INSERT_CHANGE_LINK_SQL: &str =
    "INSERT INTO glpi_changes_tickets (changes_id, tickets_id) VALUES (?, ?)";

pub struct SeedStore {
    conn: AnyConnection,
    dialect: Dialect,
}

impl SeedStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let dialect = Dialect::from_url(url)?;
        install_default_drivers();
        let conn = AnyConnection::connect(url).await?;
        debug!(?dialect, "database connection established");
        Ok(Self { conn, dialect })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Insert all incidents atomically. Returns the number of rows written.
    pub async fn insert_incidents(&mut self, incidents: &[Incident]) -> Result<u64, StoreError> {
        let mut tx = self.conn.begin().await?;
        let mut inserted = 0u64;
        for incident in incidents {
            let outcome = sqlx::query(INSERT_INCIDENT_SQL)
                .bind(incident.name.as_str())
                .bind(incident.content.as_str())
                .bind(incident.priority.code())
                .bind(incident.urgency.code())
                .bind(incident.impact.code())
                .bind(incident.status.code())
                .bind(format_timestamp(&incident.date_creation))
                .bind(format_timestamp(&incident.date_mod))
                .bind(incident.entities_id)
                .bind(incident.ticket_type)
                .bind(incident.itilcategories_id)
                .execute(&mut *tx)
                .await;
            match outcome {
                Ok(done) => inserted += done.rows_affected(),
                Err(e) => {
                    rollback_quietly(tx).await;
                    return Err(e.into());
                }
            }
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Random sample of existing incidents (`type = 1`), at most `limit` rows.
    pub async fn fetch_incidents(&mut self, limit: u32) -> Result<Vec<IncidentRef>, StoreError> {
        let sql = format!(
            "SELECT {id}, name, {entities}, {priority} FROM glpi_tickets \
             WHERE type = ? ORDER BY {order} LIMIT ?",
            id = self.dialect.signed("id"),
            entities = self.dialect.signed("entities_id"),
            priority = self.dialect.signed("priority"),
            order = self.dialect.random_order(),
        );
        let rows = sqlx::query(&sql)
            .bind(INCIDENT_TYPE)
            .bind(i64::from(limit))
            .fetch_all(&mut self.conn)
            .await?;
        let incidents = rows
            .iter()
            .map(incident_ref_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = incidents.len(), "fetched incidents for correlation");
        Ok(incidents)
    }

    /// Insert a batch of changes and their incident links as one transaction.
    ///
    /// Returns the number of changes committed; on error nothing from the
    /// batch remains.
    pub async fn insert_change_batch(&mut self, changes: &[Change]) -> Result<u64, StoreError> {
        if changes.is_empty() {
            return Ok(0);
        }
        let mut tx = self.conn.begin().await?;
        match insert_changes(&mut tx, self.dialect, changes).await {
            Ok(count) => {
                tx.commit().await?;
                Ok(count)
            }
            Err(e) => {
                rollback_quietly(tx).await;
                Err(e)
            }
        }
    }

    pub async fn close(self) -> Result<(), StoreError> {
        self.conn.close().await?;
        Ok(())
    }
}

async fn insert_changes(
    conn: &mut AnyConnection,
    dialect: Dialect,
    changes: &[Change],
) -> Result<u64, StoreError> {
    let mut count = 0u64;
    for change in changes {
        let date = format_timestamp(&change.date);
        let date_mod = format_timestamp(&change.date_mod);
        let done = sqlx::query(INSERT_CHANGE_SQL)
            .bind(change.name.as_str())
            .bind(change.content.as_str())
            .bind(change.entities_id)
            .bind(date)
            .bind(date_mod)
            .bind(change.status.code())
            .bind(change.priority.code())
            .bind(change.urgency.code())
            .bind(change.impact.code())
            .bind(change.global_validation.code())
            .bind(change.users_id_recipient)
            .bind(change.users_id_lastupdater)
            .execute(&mut *conn)
            .await?;
        let change_id = match done.last_insert_id() {
            Some(id) => id,
            None => generated_id(conn, dialect, "glpi_changes").await?,
        };

        for incident_id in &change.related_incident_ids {
            sqlx::query(INSERT_CHANGE_LINK_SQL)
                .bind(change_id)
                .bind(*incident_id)
                .execute(&mut *conn)
                .await?;
        }
        count += 1;
    }
    Ok(count)
}

/// Ask the connection for the id it just generated; the `Any` SQLite driver
/// does not report it in the query result.
async fn generated_id(
    conn: &mut AnyConnection,
    dialect: Dialect,
    table: &'static str,
) -> Result<i64, StoreError> {
    let id: Option<i64> = sqlx::query_scalar(dialect.last_insert_id_sql())
        .fetch_optional(&mut *conn)
        .await?;
    id.filter(|id| *id > 0)
        .ok_or(StoreError::MissingInsertId { table })
}

async fn rollback_quietly(tx: sqlx::Transaction<'_, sqlx::Any>) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}

fn incident_ref_from_row(row: &AnyRow) -> Result<IncidentRef, sqlx::Error> {
    Ok(IncidentRef {
        id: row.try_get("id")?,
        name: row.try_get::<Option<String>, _>("name")?.unwrap_or_default(),
        entities_id: row.try_get("entities_id")?,
        priority: row.try_get("priority")?,
    })
}

/// Drop credentials from a URL before it reaches an error message or a log.
fn redact_url(url: &str) -> String {
    match url.split_once('@') {
        Some((prefix, rest)) => {
            let scheme = prefix.split_once("://").map(|(s, _)| s).unwrap_or(prefix);
            format!("{scheme}://***@{rest}")
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_is_picked_from_the_scheme() {
        assert_eq!(
            Dialect::from_url("mysql://glpi:glpi@db:3306/glpi").unwrap(),
            Dialect::MySql
        );
        assert_eq!(
            Dialect::from_url("sqlite:///tmp/seed.db?mode=rwc").unwrap(),
            Dialect::Sqlite
        );
        assert!(matches!(
            Dialect::from_url("postgres://u:secret@h/db"),
            Err(StoreError::UnsupportedUrl(u)) if !u.contains("secret")
        ));
    }

    #[test]
    fn signed_cast_is_aliased_back_to_the_column() {
        assert_eq!(Dialect::MySql.signed("id"), "CAST(id AS SIGNED) AS id");
        assert_eq!(Dialect::Sqlite.signed("id"), "CAST(id AS INTEGER) AS id");
    }

    #[test]
    fn generated_id_query_matches_the_dialect() {
        assert_eq!(Dialect::Sqlite.last_insert_id_sql(), "SELECT last_insert_rowid()");
        assert!(Dialect::MySql.last_insert_id_sql().contains("LAST_INSERT_ID()"));
    }
}
