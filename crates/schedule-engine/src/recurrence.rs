//! Recurring-call expansion -- turns one call template into dated instances.
//!
//! The `weekdays` rule is expanded through the `rrule` crate
//! (`FREQ=DAILY;BYDAY=MO,TU,WE,TH,FR`) so every instance keeps the anchor's
//! wall-clock time of day in the requested timezone, across DST changes.
//!
//! `weekly` and `monthly` exist in the data model but have no expansion yet:
//! they produce the anchor instance alone and log a warning.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Months, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::error::{Result, ScheduleError};
use crate::event::{Event, EventId, EventTemplate, RecurrencePattern};

/// Attempts at drawing an unused id before giving up on a generator.
const MAX_ID_ATTEMPTS: usize = 64;

/// Longest weekday window expanded in one call.
pub const MAX_HORIZON_DAYS: i64 = u16::MAX as i64 - 2;

/// Source of fresh event ids for expanded instances.
pub trait IdGenerator {
    fn next_id(&mut self) -> EventId;
}

/// Monotonic counter ids: "1", "2", "3", ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> EventId {
        let id = EventId::from(self.next);
        self.next += 1;
        id
    }
}

/// Time-ordered UUID v7 ids.
#[cfg(feature = "uuid")]
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

#[cfg(feature = "uuid")]
impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> EventId {
        EventId::new(uuid::Uuid::now_v7().to_string())
    }
}

/// How far past the anchor a series runs. The end is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    /// Calendar months; a day past the end of the target month clamps to its
    /// last day (Nov 30 + 3 months = Feb 28/29).
    Months(u32),
    Span(Duration),
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon::Months(3)
    }
}

impl Horizon {
    fn end_from(&self, anchor: NaiveDateTime) -> Result<NaiveDateTime> {
        let end = match *self {
            Horizon::Months(n) => anchor.checked_add_months(Months::new(n)),
            Horizon::Span(span) => anchor.checked_add_signed(span),
        };
        end.ok_or_else(|| ScheduleError::Expansion(format!("horizon {:?} is out of range", self)))
    }
}

/// Expand a call template into concrete instances, using UTC wall-clock time.
///
/// See [`expand_recurrence_in_tz`].
pub fn expand_recurrence(
    template: &EventTemplate,
    anchor_start: DateTime<Utc>,
    duration_minutes: i64,
    pattern: RecurrencePattern,
    horizon: Horizon,
    ids: &mut dyn IdGenerator,
) -> Result<Vec<Event>> {
    expand_recurrence_in_tz(
        template,
        anchor_start,
        duration_minutes,
        pattern,
        horizon,
        chrono_tz::UTC,
        ids,
    )
}

/// Expand a call template into concrete instances.
///
/// Instances start at or after `anchor_start` and strictly before
/// `anchor_start + horizon`, each at the anchor's time of day in `timezone`,
/// ordered by start. Every instance gets an id from `ids` that differs from
/// the template's id and from its siblings; other fields are copied from the
/// template.
///
/// # Errors
/// Returns `ScheduleError::InvalidDuration` if `duration_minutes <= 0` or an
/// instance's end falls outside the representable range.
/// Returns `ScheduleError::Expansion` if the horizon overflows, a `weekdays`
/// window is longer than [`MAX_HORIZON_DAYS`], or `ids` keeps returning ids
/// already in use.
pub fn expand_recurrence_in_tz(
    template: &EventTemplate,
    anchor_start: DateTime<Utc>,
    duration_minutes: i64,
    pattern: RecurrencePattern,
    horizon: Horizon,
    timezone: Tz,
    ids: &mut dyn IdGenerator,
) -> Result<Vec<Event>> {
    if duration_minutes <= 0 {
        return Err(ScheduleError::InvalidDuration(duration_minutes));
    }

    let local_anchor = anchor_start.with_timezone(&timezone).naive_local();
    let local_end = horizon.end_from(local_anchor)?;
    if local_end <= local_anchor {
        return Ok(Vec::new());
    }

    let starts = match pattern {
        RecurrencePattern::Weekdays => weekday_starts(local_anchor, local_end, timezone)?,
        RecurrencePattern::Weekly | RecurrencePattern::Monthly => {
            tracing::warn!(
                pattern = %pattern,
                template = %template.id,
                "recurrence pattern has no expansion rule; creating a single instance"
            );
            vec![anchor_start]
        }
    };

    let duration = Duration::try_minutes(duration_minutes)
        .ok_or(ScheduleError::InvalidDuration(duration_minutes))?;
    let mut issued: HashSet<EventId> = HashSet::new();
    issued.insert(template.id.clone());

    let mut events = Vec::with_capacity(starts.len());
    for start in starts {
        let end = start
            .checked_add_signed(duration)
            .ok_or(ScheduleError::InvalidDuration(duration_minutes))?;
        let id = fresh_id(ids, &mut issued)?;
        events.push(Event::from_template(template, id, start, end));
    }

    tracing::debug!(
        pattern = %pattern,
        instances = events.len(),
        "recurrence expanded"
    );

    Ok(events)
}

/// Monday-to-Friday starts in `[local_anchor, local_end)`, resolved in `tz`.
fn weekday_starts(
    local_anchor: NaiveDateTime,
    local_end: NaiveDateTime,
    tz: Tz,
) -> Result<Vec<DateTime<Utc>>> {
    let dtstart = local_anchor.format("%Y%m%dT%H%M%S");

    // The rrule crate wants UNTIL in the same form as DTSTART: "Z"-suffixed
    // for UTC, bare local time otherwise.
    let mut until = local_end.format("%Y%m%dT%H%M%S").to_string();
    if tz == chrono_tz::UTC {
        until.push('Z');
    }

    let rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:FREQ=DAILY;BYDAY=MO,TU,WE,TH,FR;UNTIL={}",
        tz.name(),
        dtstart,
        until
    );

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| ScheduleError::Expansion(format!("{}", e)))?;

    // UNTIL is inclusive, so the window holds at most `days + 1` instances.
    // The limit sits one above that; hitting it means rrule stopped early.
    let days = (local_end - local_anchor).num_days();
    let limit = u16::try_from(days + 2).map_err(|_| horizon_too_long(days))?;

    let result = rrule_set.all(limit);
    if result.limited {
        return Err(horizon_too_long(days));
    }

    let starts = result
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        // UNTIL is inclusive; the horizon end is not.
        .filter(|start| start.with_timezone(&tz).naive_local() < local_end)
        .collect();

    Ok(starts)
}

fn horizon_too_long(days: i64) -> ScheduleError {
    ScheduleError::Expansion(format!(
        "horizon too long: {} days exceeds the {}-day expansion limit",
        days,
        MAX_HORIZON_DAYS
    ))
}

fn fresh_id(ids: &mut dyn IdGenerator, issued: &mut HashSet<EventId>) -> Result<EventId> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = ids.next_id();
        if issued.insert(id.clone()) {
            return Ok(id);
        }
    }
    Err(ScheduleError::Expansion(
        "id generator keeps returning ids already in use".to_string(),
    ))
}
