//! The scheduled-call record shared with the calendar UI.
//!
//! Field names serialize in camelCase so the JSON shape matches what the web
//! front end reads and writes. Timestamps stay as the strings the caller sent;
//! they are parsed on demand so a bad value can be reported against the id of
//! the event that carried it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ScheduleError};

/// Identifier of a scheduled call.
///
/// Accepts either a JSON string or a JSON integer on input and always
/// serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for EventId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

impl From<RawId> for EventId {
    fn from(raw: RawId) -> Self {
        Self(raw.into_string())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(RawId::into_string)
}

/// Lifecycle state of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

/// Whether the call was booked ahead of time or squeezed in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    #[default]
    Fixed,
    Impromptu,
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallType::Fixed => f.write_str("fixed"),
            CallType::Impromptu => f.write_str("impromptu"),
        }
    }
}

/// Repetition rule a recurring call was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    /// Every Monday through Friday.
    Weekdays,
    Weekly,
    Monthly,
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrencePattern::Weekdays => f.write_str("weekdays"),
            RecurrencePattern::Weekly => f.write_str("weekly"),
            RecurrencePattern::Monthly => f.write_str("monthly"),
        }
    }
}

impl FromStr for RecurrencePattern {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekdays" => Ok(RecurrencePattern::Weekdays),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            _ => Err(ScheduleError::InvalidRule(s.to_string())),
        }
    }
}

/// A single scheduled call between a project manager and a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    /// The project manager the call is booked against.
    pub assignee_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub client_id: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i64,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub call_type: CallType,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
}

impl Event {
    /// Build a concrete call from a template and its timing.
    pub fn from_template(
        template: &EventTemplate,
        id: EventId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: template.title.clone(),
            assignee_id: template.assignee_id.clone(),
            client_id: template.client_id.clone(),
            start_time: format_timestamp(start),
            end_time: format_timestamp(end),
            duration_minutes: (end - start).num_minutes(),
            status: template.status,
            call_type: template.call_type,
            is_recurring: template.is_recurring,
            recurrence_pattern: template.recurrence_pattern,
        }
    }

    /// Parsed `startTime`.
    pub fn start(&self) -> Result<DateTime<Utc>> {
        self.parse_field(&self.start_time)
    }

    /// Parsed `endTime`.
    pub fn end(&self) -> Result<DateTime<Utc>> {
        self.parse_field(&self.end_time)
    }

    /// Parsed `(start, end)` pair. Does not check ordering.
    pub fn span(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        Ok((self.start()?, self.end()?))
    }

    /// Parsed `(start, end)` pair, rejecting events that do not end after they start.
    pub fn valid_span(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let (start, end) = self.span()?;
        if end <= start {
            return Err(ScheduleError::InvalidInterval {
                event_id: self.id.clone(),
            });
        }
        Ok((start, end))
    }

    /// Return a copy moved to a new slot and assignee.
    ///
    /// `durationMinutes` is recomputed from the new span.
    pub fn reschedule(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        assignee_id: impl Into<String>,
    ) -> Self {
        Self {
            assignee_id: assignee_id.into(),
            start_time: format_timestamp(start),
            end_time: format_timestamp(end),
            duration_minutes: (end - start).num_minutes(),
            ..self.clone()
        }
    }

    /// The timing-free part of this event, for expanding it into a series.
    pub fn template(&self) -> EventTemplate {
        EventTemplate {
            id: self.id.clone(),
            title: self.title.clone(),
            assignee_id: self.assignee_id.clone(),
            client_id: self.client_id.clone(),
            status: self.status,
            call_type: self.call_type,
            is_recurring: self.is_recurring,
            recurrence_pattern: self.recurrence_pattern,
        }
    }

    fn parse_field(&self, value: &str) -> Result<DateTime<Utc>> {
        parse_timestamp(value).ok_or_else(|| ScheduleError::InvalidTimestamp {
            event_id: self.id.clone(),
            value: value.to_string(),
        })
    }
}

/// Every [`Event`] field except timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplate {
    pub id: EventId,
    pub title: String,
    pub assignee_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub client_id: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub call_type: CallType,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
}

/// A project manager calls are booked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManager {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a timestamp string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 with an offset (e.g. "2026-02-17T14:00:00-08:00") and
/// naive local time (e.g. "2026-02-17T14:00:00"), which is taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|ndt| ndt.and_utc())
}

/// Render an instant the way produced events carry it: "2024-03-01T10:00:00Z".
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_offset_and_naive_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 17, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T17:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T09:00:00-08:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T17:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T17:00"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn pattern_parsing_is_case_insensitive() {
        assert_eq!(
            "Weekdays".parse::<RecurrencePattern>().unwrap(),
            RecurrencePattern::Weekdays
        );
        assert_eq!(
            "fortnightly".parse::<RecurrencePattern>(),
            Err(ScheduleError::InvalidRule("fortnightly".to_string()))
        );
    }
}
