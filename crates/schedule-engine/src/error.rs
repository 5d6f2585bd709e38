//! Error types for schedule-engine operations.

use thiserror::Error;

use crate::event::EventId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// A `startTime`/`endTime` field could not be parsed into an instant.
    #[error("Invalid timestamp on event {event_id}: '{value}'")]
    InvalidTimestamp { event_id: EventId, value: String },

    /// The event ends at or before it starts.
    #[error("Invalid interval on event {event_id}: end is not after start")]
    InvalidInterval { event_id: EventId },

    #[error("Invalid duration: {0} minutes (must be positive and in range)")]
    InvalidDuration(i64),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Expansion error: {0}")]
    Expansion(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
