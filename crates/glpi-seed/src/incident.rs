//! Synthetic incident generator.

use chrono::{Duration, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::CLOUD_PROVIDERS;
use crate::vocab::{Level, TicketStatus};

/// GLPI ticket type for incidents (2 would be a request).
pub const INCIDENT_TYPE: i64 = 1;

/// Creation dates are spread over this many trailing days.
pub const LOOKBACK_DAYS: i64 = 365;

const MIN_MOD_DELAY_HOURS: i64 = 1;
const MAX_MOD_DELAY_HOURS: i64 = 48;

/// One row for `glpi_tickets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
    pub name: String,
    pub content: String,
    pub priority: Level,
    pub urgency: Level,
    pub impact: Level,
    pub status: TicketStatus,
    pub date_creation: NaiveDateTime,
    pub date_mod: NaiveDateTime,
    pub entities_id: i64,
    pub ticket_type: i64,
    pub itilcategories_id: i64,
}

/// Generate `count` independent incidents relative to `now`.
pub fn generate_incidents<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    now: NaiveDateTime,
) -> Vec<Incident> {
    (0..count).map(|_| generate_incident(rng, now)).collect()
}

pub fn generate_incident<R: Rng + ?Sized>(rng: &mut R, now: NaiveDateTime) -> Incident {
    // The catalog is a non-empty constant, so `choose` cannot come back empty.
    let provider = CLOUD_PROVIDERS
        .choose(rng)
        .unwrap_or(&CLOUD_PROVIDERS[0]);
    let component = provider
        .components
        .choose(rng)
        .unwrap_or(&provider.components[0]);
    let issue = *component.issues.choose(rng).unwrap_or(&component.issues[0]);

    let cloud = provider.name;
    let component = component.name;

    let date_creation = random_creation_date(rng, now);
    let delay = rng.gen_range(MIN_MOD_DELAY_HOURS..=MAX_MOD_DELAY_HOURS);

    Incident {
        name: format!("{cloud} {component} - {issue}"),
        content: format!(
            "Alert: {issue} detected in {component}.\n\n\
             Detailed Analysis:\n\
             - Service affected: {cloud} {component}\n\
             - Issue Description: {issue}\n\
             - Potential root cause identified\n\
             - Mitigation steps initiated"
        ),
        priority: random_level(rng),
        urgency: random_level(rng),
        impact: random_level(rng),
        status: random_status(rng),
        date_creation,
        date_mod: date_creation + Duration::hours(delay),
        entities_id: 0,
        ticket_type: INCIDENT_TYPE,
        itilcategories_id: 0,
    }
}

pub(crate) fn random_level<R: Rng + ?Sized>(rng: &mut R) -> Level {
    Level::ALL[rng.gen_range(0..Level::ALL.len())]
}

fn random_status<R: Rng + ?Sized>(rng: &mut R) -> TicketStatus {
    TicketStatus::ALL[rng.gen_range(0..TicketStatus::ALL.len())]
}

fn random_creation_date<R: Rng + ?Sized>(rng: &mut R, now: NaiveDateTime) -> NaiveDateTime {
    let window = Duration::days(LOOKBACK_DAYS).num_seconds();
    now - Duration::seconds(rng.gen_range(0..window))
}
