//! Dashboard reducers over a call list.
//!
//! These are plain aggregations: headline counts, per-PM load, the hourly
//! start histogram, live calls, and a single PM's day at slot granularity.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::SchedulerConfig;
use crate::conflict::detect_conflicts;
use crate::error::Result;
use crate::event::{CallType, Event, EventStatus, ProjectManager};
use crate::freebusy::merge_busy_periods;

/// Headline numbers for the dashboard cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_pms: usize,
    pub total_calls: usize,
    pub completed_calls: usize,
    /// Number of conflict groups.
    pub conflict_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PmAvailability {
    pub assignee_id: String,
    pub name: String,
    pub total_hours: f64,
    pub busy_hours: f64,
    pub available_hours: f64,
    pub availability_percentage: f64,
    pub hours_by_call_type: BTreeMap<CallType, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyCount {
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub assignee_id: String,
    pub name: String,
    pub calls: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub time: NaiveTime,
    pub is_available: bool,
}

/// One project manager's working day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAvailability {
    pub assignee_id: String,
    pub date: NaiveDate,
    pub available_hours: f64,
    pub booked_hours: f64,
    pub availability_percentage: f64,
    pub time_slots: Vec<TimeSlot>,
}

pub fn dashboard_metrics(events: &[Event], managers: &[ProjectManager]) -> Result<DashboardMetrics> {
    Ok(DashboardMetrics {
        total_pms: managers.len(),
        total_calls: events.len(),
        completed_calls: events
            .iter()
            .filter(|e| e.status == EventStatus::Completed)
            .count(),
        conflict_count: detect_conflicts(events)?.len(),
    })
}

/// Booked vs. free hours per project manager.
///
/// Busy time is the plain sum of call lengths, so overlapping calls count
/// twice and `available_hours` can go negative for an overbooked PM.
///
/// Fails with `ScheduleError::Config` when `config` does not validate, e.g.
/// a zero daily capacity.
pub fn pm_availability(
    events: &[Event],
    managers: &[ProjectManager],
    config: &SchedulerConfig,
) -> Result<Vec<PmAvailability>> {
    config.validate()?;
    let total_hours = config.daily_capacity_hours;

    managers
        .iter()
        .map(|pm| {
            let mut busy_hours = 0.0;
            let mut hours_by_call_type: BTreeMap<CallType, f64> = BTreeMap::new();

            for event in events.iter().filter(|e| e.assignee_id == pm.id) {
                let (start, end) = event.span()?;
                let hours = (end - start).num_minutes() as f64 / 60.0;
                busy_hours += hours;
                *hours_by_call_type.entry(event.call_type).or_default() += hours;
            }

            let available_hours = total_hours - busy_hours;
            Ok(PmAvailability {
                assignee_id: pm.id.clone(),
                name: pm.name.clone(),
                total_hours,
                busy_hours,
                available_hours,
                availability_percentage: available_hours / total_hours * 100.0,
                hours_by_call_type,
            })
        })
        .collect()
}

/// How many calls start in each working hour, in the configured timezone.
pub fn hourly_distribution(events: &[Event], config: &SchedulerConfig) -> Result<Vec<HourlyCount>> {
    let tz = config.tz()?;
    let start_hours = events
        .iter()
        .map(|e| Ok(e.start()?.with_timezone(&tz).hour()))
        .collect::<Result<Vec<u32>>>()?;

    Ok(config
        .working_hours
        .hours()
        .map(|hour| HourlyCount {
            hour,
            count: start_hours.iter().filter(|&&h| h == hour).count(),
        })
        .collect())
}

pub fn workload_distribution(events: &[Event], managers: &[ProjectManager]) -> Vec<Workload> {
    managers
        .iter()
        .map(|pm| Workload {
            assignee_id: pm.id.clone(),
            name: pm.name.clone(),
            calls: events.iter().filter(|e| e.assignee_id == pm.id).count(),
        })
        .collect()
}

/// Calls running at `now`; both ends inclusive.
pub fn in_progress_calls(events: &[Event], now: DateTime<Utc>) -> Result<Vec<&Event>> {
    let mut live = Vec::new();
    for event in events {
        let (start, end) = event.span()?;
        if start <= now && now <= end {
            live.push(event);
        }
    }
    Ok(live)
}

/// Booked time and a slot grid for one PM on one day, within working hours.
///
/// Unlike [`pm_availability`], overlapping calls are merged first, so booked
/// time never exceeds the working window.
pub fn daily_availability(
    events: &[Event],
    assignee_id: &str,
    date: NaiveDate,
    config: &SchedulerConfig,
) -> Result<DailyAvailability> {
    config.validate()?;
    let tz = config.tz()?;
    let hours = config.working_hours;

    let opens = date.and_time(hours.opens_at());
    let closes = opens + Duration::minutes(hours.length_minutes());
    let window_start = local_to_utc(tz, opens);
    let window_end = local_to_utc(tz, closes);

    let spans = events
        .iter()
        .filter(|e| e.assignee_id == assignee_id)
        .map(Event::span)
        .collect::<Result<Vec<_>>>()?;
    let busy = merge_busy_periods(&spans, window_start, window_end);

    let window_minutes = (window_end - window_start).num_minutes();
    let booked_minutes: i64 = busy.iter().map(|(s, e)| (*e - *s).num_minutes()).sum();
    let available_minutes = window_minutes - booked_minutes;

    let step = Duration::minutes(i64::from(config.slot_minutes));
    let mut time_slots = Vec::new();
    let mut slot = opens;
    while slot < closes {
        let slot_start = local_to_utc(tz, slot);
        let slot_end = local_to_utc(tz, (slot + step).min(closes));
        let is_available = !busy.iter().any(|(s, e)| *s < slot_end && slot_start < *e);
        time_slots.push(TimeSlot {
            time: slot.time(),
            is_available,
        });
        slot += step;
    }

    Ok(DailyAvailability {
        assignee_id: assignee_id.to_string(),
        date,
        available_hours: available_minutes as f64 / 60.0,
        booked_hours: booked_minutes as f64 / 60.0,
        availability_percentage: if window_minutes > 0 {
            available_minutes as f64 / window_minutes as f64 * 100.0
        } else {
            0.0
        },
        time_slots,
    })
}

/// Resolve a wall-clock time in `tz`. Times inside a DST gap move forward an hour.
fn local_to_utc(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}
