//! # schedule-engine
//!
//! Conflict detection and recurring-call expansion for project-manager call
//! schedules.
//!
//! The calendar UI holds the authoritative call list. After every change it
//! asks [`detect_conflicts`] which project managers are double-booked, and when
//! a recurring call is submitted it asks [`expand_recurrence`] for the concrete
//! dated instances to store. Both are pure functions over a snapshot.
//!
//! ## Modules
//!
//! - [`event`]: the call record, templates, project managers, timestamp parsing
//! - [`conflict`]: overlap detection grouped per assignee
//! - [`recurrence`]: template → dated instances, id generators, horizons
//! - [`freebusy`]: merged busy periods and free slots
//! - [`analytics`]: dashboard reducers (metrics, availability, distributions)
//! - [`config`]: working hours, capacity, default horizon, timezone
//! - [`error`]: Error types

pub mod analytics;
pub mod config;
pub mod conflict;
pub mod error;
pub mod event;
pub mod freebusy;
pub mod recurrence;

pub use analytics::{
    daily_availability, dashboard_metrics, hourly_distribution, in_progress_calls,
    pm_availability, workload_distribution,
};
pub use config::{SchedulerConfig, WorkingHours};
pub use conflict::{check_conflicts, detect_conflicts, ConflictGroup, ConflictGroups, GroupKey};
pub use error::ScheduleError;
pub use event::{
    CallType, Event, EventId, EventStatus, EventTemplate, ProjectManager, RecurrencePattern,
};
pub use freebusy::{find_first_free_slot, find_free_slots};
#[cfg(feature = "uuid")]
pub use recurrence::UuidIds;
pub use recurrence::{
    expand_recurrence, expand_recurrence_in_tz, Horizon, IdGenerator, SequentialIds,
    MAX_HORIZON_DAYS,
};
