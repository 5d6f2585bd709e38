//! WASM bindings for schedule-engine.
//!
//! Exposes conflict detection, weekday expansion, dashboard metrics and
//! free-slot search to the calendar UI via `wasm-bindgen`. Calls, templates
//! and results cross the boundary as JSON strings in the same camelCase shape
//! the UI stores.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p schedule-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/src/wasm/ \
//!   target/wasm32-unknown-unknown/release/schedule_engine_wasm.wasm
//! ```

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use schedule_engine::event::parse_timestamp;
use schedule_engine::{
    ConflictGroup, Event, EventTemplate, Horizon, ProjectManager, RecurrencePattern,
    SchedulerConfig, SequentialIds,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn from_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid {} JSON: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Parse a timestamp argument with the same rules event fields use.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, JsValue> {
    parse_timestamp(s).ok_or_else(|| JsValue::from_str(&format!("Invalid datetime '{}'", s)))
}

fn parse_config(config_json: Option<String>) -> Result<SchedulerConfig, JsValue> {
    let config: SchedulerConfig = match config_json {
        Some(json) => from_json(&json, "config")?,
        None => SchedulerConfig::default(),
    };
    config.validate().map_err(js_err)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Group overlapping calls per project manager.
///
/// `events_json` is the full call list. Returns a JSON array of
/// `{key: {assigneeId, start}, events: [...]}` ordered by key.
#[wasm_bindgen(js_name = "detectConflicts")]
pub fn detect_conflicts(events_json: &str) -> Result<String, JsValue> {
    let events: Vec<Event> = from_json(events_json, "events")?;
    let groups = schedule_engine::detect_conflicts(&events).map_err(js_err)?;
    let groups: Vec<ConflictGroup> = groups.into_groups();
    to_json(&groups)
}

/// Human-readable conflict summary for the alert banner, or `undefined` when
/// nobody is double-booked.
///
/// `managers_json` is used to show PM names; unknown assignees fall back to
/// their id.
#[wasm_bindgen(js_name = "conflictSummary")]
pub fn conflict_summary(events_json: &str, managers_json: &str) -> Result<Option<String>, JsValue> {
    let events: Vec<Event> = from_json(events_json, "events")?;
    let managers: Vec<ProjectManager> = from_json(managers_json, "managers")?;
    let groups = schedule_engine::detect_conflicts(&events).map_err(js_err)?;

    Ok(groups.summary(|id| {
        managers
            .iter()
            .find(|pm| pm.id == id)
            .map(|pm| pm.name.as_str())
    }))
}

/// Existing calls that a candidate call would overlap.
///
/// Returns a JSON array of `{event, overlapMinutes}`.
#[wasm_bindgen(js_name = "checkConflicts")]
pub fn check_conflicts(candidate_json: &str, events_json: &str) -> Result<String, JsValue> {
    let candidate: Event = from_json(candidate_json, "candidate")?;
    let existing: Vec<Event> = from_json(events_json, "events")?;
    let overlaps = schedule_engine::check_conflicts(&candidate, &existing).map_err(js_err)?;
    to_json(&overlaps)
}

/// Expand a call template into dated instances.
///
/// # Arguments
/// - `template_json` -- the submitted call without times
/// - `anchor_start` -- first instance start (ISO 8601)
/// - `duration_minutes` -- length of each instance; must be positive
/// - `pattern` -- "weekdays", "weekly" or "monthly"
/// - `horizon_days` -- optional window length; three months when omitted
/// - `timezone` -- optional IANA timezone whose wall-clock time is kept
/// - `first_id` -- first id handed out to instances (the template's id is skipped)
#[wasm_bindgen(js_name = "expandRecurrence")]
pub fn expand_recurrence(
    template_json: &str,
    anchor_start: &str,
    duration_minutes: i32,
    pattern: &str,
    horizon_days: Option<u32>,
    timezone: Option<String>,
    first_id: u32,
) -> Result<String, JsValue> {
    let template: EventTemplate = from_json(template_json, "template")?;
    let anchor = parse_datetime(anchor_start)?;
    let pattern: RecurrencePattern = pattern.parse().map_err(js_err)?;
    let horizon = horizon_days
        .map(|days| Horizon::Span(Duration::days(i64::from(days))))
        .unwrap_or_default();
    let tz: Tz = match timezone {
        Some(name) => name
            .parse()
            .map_err(|_| JsValue::from_str(&format!("Invalid timezone: {}", name)))?,
        None => chrono_tz::UTC,
    };

    let events = schedule_engine::expand_recurrence_in_tz(
        &template,
        anchor,
        i64::from(duration_minutes),
        pattern,
        horizon,
        tz,
        &mut SequentialIds::starting_at(u64::from(first_id)),
    )
    .map_err(js_err)?;

    to_json(&events)
}

/// Everything the dashboard cards and charts need in one call.
///
/// `config_json` optionally overrides working hours, capacity and timezone.
/// Returns `{metrics, availability, hourlyDistribution, workload}`.
#[wasm_bindgen(js_name = "dashboardMetrics")]
pub fn dashboard_metrics(
    events_json: &str,
    managers_json: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let events: Vec<Event> = from_json(events_json, "events")?;
    let managers: Vec<ProjectManager> = from_json(managers_json, "managers")?;
    let config = parse_config(config_json)?;

    let report = serde_json::json!({
        "metrics": schedule_engine::dashboard_metrics(&events, &managers).map_err(js_err)?,
        "availability": schedule_engine::pm_availability(&events, &managers, &config).map_err(js_err)?,
        "hourlyDistribution": schedule_engine::hourly_distribution(&events, &config).map_err(js_err)?,
        "workload": schedule_engine::workload_distribution(&events, &managers),
    });
    to_json(&report)
}

/// Calls running at `now` (ISO 8601), both ends inclusive.
#[wasm_bindgen(js_name = "inProgressCalls")]
pub fn in_progress_calls(events_json: &str, now: &str) -> Result<String, JsValue> {
    let events: Vec<Event> = from_json(events_json, "events")?;
    let now = parse_datetime(now)?;
    let live = schedule_engine::in_progress_calls(&events, now).map_err(js_err)?;
    to_json(&live)
}

/// Booked time and slot grid for one PM on one day (`YYYY-MM-DD`).
#[wasm_bindgen(js_name = "dailyAvailability")]
pub fn daily_availability(
    events_json: &str,
    assignee_id: &str,
    date: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let events: Vec<Event> = from_json(events_json, "events")?;
    let date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid date '{}': {}", date, e)))?;
    let config = parse_config(config_json)?;
    let day =
        schedule_engine::daily_availability(&events, assignee_id, date, &config).map_err(js_err)?;
    to_json(&day)
}

/// Free time between one PM's calls within a window.
///
/// `events_json` is the call list; only calls for `assignee_id` are
/// considered. Returns `[{start, end, durationMinutes}]`.
#[wasm_bindgen(js_name = "findFreeSlots")]
pub fn find_free_slots(
    events_json: &str,
    assignee_id: &str,
    window_start: &str,
    window_end: &str,
) -> Result<String, JsValue> {
    let events: Vec<Event> = from_json(events_json, "events")?;
    let ws = parse_datetime(window_start)?;
    let we = parse_datetime(window_end)?;

    let own: Vec<Event> = events
        .into_iter()
        .filter(|e| e.assignee_id == assignee_id)
        .collect();
    let slots = schedule_engine::find_free_slots(&own, ws, we).map_err(js_err)?;
    to_json(&slots)
}
