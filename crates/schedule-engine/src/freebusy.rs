//! Compute open time between calls.
//!
//! Sorts call spans by start, merges overlapping busy periods, then reports the
//! gaps between merged periods within a window.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::event::Event;

/// A free time slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

/// Merge overlapping or adjacent busy periods, clipped to the given window.
///
/// Returns a sorted, non-overlapping list of (start, end) intervals.
pub fn merge_busy_periods(
    spans: &[(DateTime<Utc>, DateTime<Utc>)],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    // Clip to the window, discarding spans entirely outside.
    let mut intervals: Vec<(DateTime<Utc>, DateTime<Utc>)> = spans
        .iter()
        .filter(|(start, end)| *start < window_end && *end > window_start)
        .map(|(start, end)| ((*start).max(window_start), (*end).min(window_end)))
        .collect();

    if intervals.is_empty() {
        return Vec::new();
    }

    intervals.sort_by_key(|&(start, end)| (start, end));

    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    for (start, end) in intervals {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}

/// Find free slots within a window, given the calls that occupy it.
///
/// Overlapping calls are merged before computing gaps. Returns free slots
/// sorted by start time.
pub fn find_free_slots(
    events: &[Event],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<FreeSlot>> {
    let spans = events
        .iter()
        .map(Event::span)
        .collect::<Result<Vec<_>>>()?;
    let merged = merge_busy_periods(&spans, window_start, window_end);

    let mut free_slots = Vec::new();
    let mut cursor = window_start;

    for (busy_start, busy_end) in &merged {
        if cursor < *busy_start {
            free_slots.push(FreeSlot {
                start: cursor,
                end: *busy_start,
                duration_minutes: (*busy_start - cursor).num_minutes(),
            });
        }
        cursor = cursor.max(*busy_end);
    }

    if cursor < window_end {
        free_slots.push(FreeSlot {
            start: cursor,
            end: window_end,
            duration_minutes: (window_end - cursor).num_minutes(),
        });
    }

    Ok(free_slots)
}

/// First free slot of at least `min_duration_minutes`, e.g. room for a new call.
pub fn find_first_free_slot(
    events: &[Event],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_duration_minutes: i64,
) -> Result<Option<FreeSlot>> {
    Ok(find_free_slots(events, window_start, window_end)?
        .into_iter()
        .find(|slot| slot.duration_minutes >= min_duration_minutes))
}
