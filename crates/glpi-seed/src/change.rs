//! Synthetic change generator, correlated with existing incidents.
//!
//! Each change:
//! - links 1–3 distinct incidents from the fetched sample (the first is the
//!   "primary" incident),
//! - takes its priority from a 3-wide window around the primary incident's
//!   priority,
//! - derives `global_validation` from its status.

use chrono::{Duration, NaiveDateTime};
use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::catalog::{
    render_phrase, CHANGE_TYPES, IMPACT_PHRASES, OBJECTIVE_PHRASES, PLAN_STEP_PHRASES,
};
use crate::incident::random_level;
use crate::vocab::{ChangeStatus, GlobalValidation, Level};

/// GLPI user id stamped as recipient and last updater (the default admin).
pub const DEFAULT_ADMIN_USER_ID: i64 = 2;

pub const MAX_RELATED_INCIDENTS: usize = 3;

/// The projection of an existing incident used for correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentRef {
    pub id: i64,
    pub name: String,
    pub entities_id: i64,
    pub priority: i64,
}

/// One row for `glpi_changes` plus its linkage rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub name: String,
    pub content: String,
    pub entities_id: i64,
    pub date: NaiveDateTime,
    pub date_mod: NaiveDateTime,
    pub status: ChangeStatus,
    pub priority: Level,
    pub urgency: Level,
    pub impact: Level,
    pub global_validation: GlobalValidation,
    pub users_id_recipient: i64,
    pub users_id_lastupdater: i64,
    pub related_incident_ids: Vec<i64>,
}

/// Build one change correlated with `incidents`.
///
/// Returns `None` when the sample is empty.
pub fn generate_change<R: Rng + ?Sized>(
    rng: &mut R,
    incidents: &[IncidentRef],
    now: NaiveDateTime,
) -> Option<Change> {
    if incidents.is_empty() {
        return None;
    }

    let related_count = rng.gen_range(1..=MAX_RELATED_INCIDENTS.min(incidents.len()));
    let related: Vec<&IncidentRef> = index::sample(rng, incidents.len(), related_count)
        .into_iter()
        .map(|i| &incidents[i])
        .collect();
    let primary = related[0];

    let change_type = CHANGE_TYPES.choose(rng)?;
    let scenario = *change_type.scenarios.choose(rng)?;

    let status = ChangeStatus::ALL[rng.gen_range(0..ChangeStatus::ALL.len())];
    let priority = correlated_priority(rng, primary.priority);
    let impact = random_level(rng);
    let urgency = random_level(rng);

    let date = random_change_date(rng, now);
    let content = render_change_content(rng, change_type.name, scenario, &related);

    Some(Change {
        name: format!("{} - {}", change_type.name, scenario),
        content,
        entities_id: primary.entities_id,
        date,
        date_mod: date,
        status,
        priority,
        urgency,
        impact,
        global_validation: status.validation(),
        users_id_recipient: DEFAULT_ADMIN_USER_ID,
        users_id_lastupdater: DEFAULT_ADMIN_USER_ID,
        related_incident_ids: related.iter().map(|inc| inc.id).collect(),
    })
}

/// Pick a level uniformly from the window centred on `incident_priority`,
/// clipped to the vocabulary bounds. Out-of-range inputs are clamped first.
pub fn correlated_priority<R: Rng + ?Sized>(rng: &mut R, incident_priority: i64) -> Level {
    let last = Level::ALL.len() - 1;
    let centre = (incident_priority - 1).clamp(0, last as i64) as usize;
    let start = centre.saturating_sub(1);
    let end = (centre + 2).min(Level::ALL.len());
    Level::ALL[rng.gen_range(start..end)]
}

/// Render the markdown body of a change.
pub fn render_change_content<R: Rng + ?Sized>(
    rng: &mut R,
    change_type: &str,
    activity: &str,
    related: &[&IncidentRef],
) -> String {
    let incident_text = related
        .iter()
        .map(|inc| format!("- Related to Incident #{}: {}", inc.id, inc.name))
        .collect::<Vec<_>>()
        .join("\n");

    let objective = pick_phrase(rng, OBJECTIVE_PHRASES, change_type, activity);
    let plan_step = pick_phrase(rng, PLAN_STEP_PHRASES, change_type, activity);
    let impact_note = pick_phrase(rng, IMPACT_PHRASES, change_type, activity);

    format!(
        "## Change Summary\n\
         Implement {change_type} - {activity}\n\n\
         ## Related Incidents\n\
         {incident_text}\n\n\
         ## Objectives\n\
         {objective}\n\n\
         ## Implementation Plan\n\
         {plan_step}\n\n\
         ## Impact Assessment\n\
         {impact_note}\n"
    )
}

fn pick_phrase<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[&str],
    change_type: &str,
    activity: &str,
) -> String {
    pool.choose(rng)
        .map(|template| render_phrase(template, change_type, activity))
        .unwrap_or_default()
}

fn random_change_date<R: Rng + ?Sized>(rng: &mut R, now: NaiveDateTime) -> NaiveDateTime {
    now - Duration::days(rng.gen_range(1..=crate::incident::LOOKBACK_DAYS))
}
