//! `schedule` CLI: check PM call lists for double bookings and expand
//! recurring calls from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Report conflicts in a call list (stdin → stdout)
//! cat calls.json | schedule conflicts
//!
//! # Same, with PM names and JSON output
//! schedule conflicts -i calls.json --managers pms.json --format json
//!
//! # Would this new call clash with anything?
//! schedule check --candidate new_call.json -i calls.json
//!
//! # Expand a weekday-recurring call over the default horizon
//! schedule expand -i template.json --start 2024-03-04T09:00:00Z --duration 30 --pattern weekdays
//!
//! # Dashboard numbers and one PM's day
//! schedule metrics -i calls.json --managers pms.json
//! schedule availability -i calls.json --assignee pm-1 --date 2024-03-04
//!
//! # Working hours, capacity and timezone from a TOML file
//! schedule --config schedule.toml metrics -i calls.json --managers pms.json
//! ```

mod config;

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use schedule_engine::{
    check_conflicts, daily_availability, dashboard_metrics, detect_conflicts,
    expand_recurrence_in_tz, hourly_distribution, pm_availability, workload_distribution, Event,
    EventTemplate, Horizon, IdGenerator, ProjectManager, RecurrencePattern, ScheduleError,
    SequentialIds, UuidIds,
};

#[derive(Parser)]
#[command(
    name = "schedule",
    version,
    about = "Conflict checks and recurring-call expansion for PM schedules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file with working hours, capacity, slot size and timezone
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Group overlapping calls per project manager
    Conflicts {
        /// Call list JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Project manager JSON, used to print names instead of ids
        #[arg(long)]
        managers: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List existing calls a candidate call would overlap
    Check {
        /// The candidate call JSON
        #[arg(long)]
        candidate: String,
        /// Existing call list JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Expand a call template into dated instances
    Expand {
        /// Template JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        /// First instance start, e.g. 2024-03-04T09:00:00Z
        #[arg(long)]
        start: String,
        /// Length of each instance in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,
        /// weekdays, weekly or monthly
        #[arg(long)]
        pattern: String,
        /// Horizon in days (defaults to the configured number of months)
        #[arg(long)]
        horizon_days: Option<i64>,
        /// IANA timezone to keep wall-clock time in (defaults to the configured one)
        #[arg(long)]
        timezone: Option<String>,
        #[arg(long, value_enum, default_value_t = Ids::Sequential)]
        ids: Ids,
        /// First id handed out by the sequential generator
        #[arg(long, default_value_t = 1)]
        first_id: u64,
    },
    /// Dashboard metrics: totals, per-PM availability and distributions
    Metrics {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        managers: String,
    },
    /// Booked time and slot grid for one PM on one day
    Availability {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long)]
        assignee: String,
        /// Day to inspect, YYYY-MM-DD
        #[arg(long)]
        date: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Ids {
    Sequential,
    Uuid,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Conflicts {
            input,
            output,
            managers,
            format,
        } => {
            let events: Vec<Event> = read_json(input.as_deref())?;
            let managers: Vec<ProjectManager> = match managers {
                Some(path) => read_json(Some(&path))?,
                None => Vec::new(),
            };
            let groups = detect_conflicts(&events).context("Failed to detect conflicts")?;

            let rendered = match format {
                Format::Text => {
                    let name_of = |id: &str| {
                        managers
                            .iter()
                            .find(|pm| pm.id == id)
                            .map(|pm| pm.name.as_str())
                    };
                    let mut text = groups
                        .summary(name_of)
                        .unwrap_or_else(|| "No scheduling conflicts found.".to_string());
                    text.push('\n');
                    text
                }
                Format::Json => to_json(&groups.into_groups())?,
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Check {
            candidate,
            input,
            output,
            format,
        } => {
            let candidate: Event = read_json(Some(&candidate))?;
            let existing: Vec<Event> = read_json(input.as_deref())?;
            let overlaps =
                check_conflicts(&candidate, &existing).context("Failed to check candidate call")?;

            let rendered = match format {
                Format::Text if overlaps.is_empty() => {
                    format!("Call {} has no conflicts.\n", candidate.id)
                }
                Format::Text => {
                    let mut text = format!(
                        "Call {} overlaps {} existing call(s):\n",
                        candidate.id,
                        overlaps.len()
                    );
                    for overlap in &overlaps {
                        text.push_str(&format!(
                            "  {} \"{}\" ({} min)\n",
                            overlap.event.id, overlap.event.title, overlap.overlap_minutes
                        ));
                    }
                    text
                }
                Format::Json => to_json(&overlaps)?,
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Commands::Expand {
            input,
            output,
            start,
            duration,
            pattern,
            horizon_days,
            timezone,
            ids,
            first_id,
        } => {
            let template: EventTemplate = read_json(input.as_deref())?;
            let anchor = schedule_engine::event::parse_timestamp(&start)
                .with_context(|| format!("Invalid --start timestamp: {}", start))?;
            let pattern: RecurrencePattern = pattern.parse()?;
            let horizon = match horizon_days {
                Some(days) => Duration::try_days(days)
                    .map(Horizon::Span)
                    .with_context(|| format!("--horizon-days {} is out of range", days))?,
                None => config.default_horizon(),
            };
            let tz: Tz = match timezone {
                Some(name) => name
                    .parse()
                    .map_err(|_| ScheduleError::InvalidTimezone(name))?,
                None => config.tz()?,
            };

            let mut sequential = SequentialIds::starting_at(first_id);
            let mut uuids = UuidIds;
            let generator: &mut dyn IdGenerator = match ids {
                Ids::Sequential => &mut sequential,
                Ids::Uuid => &mut uuids,
            };

            let events = expand_recurrence_in_tz(
                &template, anchor, duration, pattern, horizon, tz, generator,
            )
            .context("Failed to expand recurring call")?;
            tracing::info!(instances = events.len(), "expanded recurring call");

            write_output(output.as_deref(), &to_json(&events)?)?;
        }
        Commands::Metrics {
            input,
            output,
            managers,
        } => {
            let events: Vec<Event> = read_json(input.as_deref())?;
            let managers: Vec<ProjectManager> = read_json(Some(&managers))?;

            let report = serde_json::json!({
                "metrics": dashboard_metrics(&events, &managers)?,
                "availability": pm_availability(&events, &managers, &config)?,
                "hourlyDistribution": hourly_distribution(&events, &config)?,
                "workload": workload_distribution(&events, &managers),
            });
            write_output(output.as_deref(), &to_json(&report)?)?;
        }
        Commands::Availability {
            input,
            output,
            assignee,
            date,
        } => {
            let events: Vec<Event> = read_json(input.as_deref())?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("Invalid --date (expected YYYY-MM-DD): {}", date))?;

            let day = daily_availability(&events, &assignee, date, &config)?;
            write_output(output.as_deref(), &to_json(&day)?)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_json<T: DeserializeOwned>(path: Option<&str>) -> Result<T> {
    let raw = read_input(path)?;
    let source = path.unwrap_or("stdin");
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse JSON from {}", source))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    json.push('\n');
    Ok(json)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
