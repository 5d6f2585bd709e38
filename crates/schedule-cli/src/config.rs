//! Loading `SchedulerConfig` from a TOML file.

use std::path::Path;

use anyhow::{Context, Result};
use schedule_engine::SchedulerConfig;

/// Read and validate the config at `path`, or fall back to defaults.
pub fn load(path: Option<&Path>) -> Result<SchedulerConfig> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => SchedulerConfig::default(),
    };

    config.validate().context("Invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

pub fn from_toml(content: &str) -> Result<SchedulerConfig> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_toml() {
        let config = from_toml(
            r#"
slot_minutes = 30
timezone = "America/Chicago"

[working_hours]
start_hour = 9
"#,
        )
        .unwrap();

        assert_eq!(config.slot_minutes, 30);
        assert_eq!(config.working_hours.start_hour, 9);
        assert_eq!(config.working_hours.end_hour, 18);
        assert_eq!(config.default_horizon_months, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(from_toml("").unwrap(), SchedulerConfig::default());
    }
}
