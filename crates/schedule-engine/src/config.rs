//! Scheduling configuration shared by the analytics and the front ends.
//!
//! Every field has a default, so a partial TOML/JSON document (or none at all)
//! is a valid configuration.

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::recurrence::Horizon;

/// The daily window calls are normally booked in, as whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingHours {
    pub start_hour: u32,
    /// Exclusive.
    pub end_hour: u32,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 18,
        }
    }
}

impl WorkingHours {
    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.start_hour..self.end_hour
    }

    pub fn opens_at(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn length_minutes(&self) -> i64 {
        i64::from(self.end_hour.saturating_sub(self.start_hour)) * 60
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub working_hours: WorkingHours,
    /// Bookable hours per project manager per day.
    pub daily_capacity_hours: f64,
    /// Granularity of the availability slot grid.
    pub slot_minutes: u32,
    pub default_horizon_months: u32,
    /// IANA timezone recurring calls keep their wall-clock time in.
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            working_hours: WorkingHours::default(),
            daily_capacity_hours: 8.0,
            slot_minutes: 60,
            default_horizon_months: 3,
            timezone: "UTC".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        let hours = &self.working_hours;
        if hours.start_hour >= hours.end_hour || hours.end_hour > 24 {
            return Err(ScheduleError::Config(format!(
                "working hours {}..{} are not a valid window",
                hours.start_hour, hours.end_hour
            )));
        }
        if self.slot_minutes == 0 {
            return Err(ScheduleError::Config(
                "slot_minutes must be positive".to_string(),
            ));
        }
        if self.daily_capacity_hours.is_nan() || self.daily_capacity_hours <= 0.0 {
            return Err(ScheduleError::Config(
                "daily_capacity_hours must be positive".to_string(),
            ));
        }
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| ScheduleError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn default_horizon(&self) -> Horizon {
        Horizon::Months(self.default_horizon_months)
    }
}
