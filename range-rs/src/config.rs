//! Configuration file for the `range` binary.

use anyhow::{bail, Context, Result};
use range_core::PickerConfig;
use range_table::SortDirection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub picker: PickerConfig,
    pub table: TableConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Where logs go while the TUI owns the terminal
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub initial_sort_key: Option<String>,
    pub initial_sort_direction: SortDirection,

    /// Length of the range committed at startup, ending today
    pub default_range_days: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_sort_key: Some("name".to_string()),
            initial_sort_direction: SortDirection::Ascending,
            default_range_days: 7,
        }
    }
}

impl Config {
    /// Loads the default config file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("range").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        self.picker.validate()?;

        if !LOG_LEVELS.contains(&self.general.log_level.to_lowercase().as_str()) {
            bail!(
                "log_level must be one of {:?}, got '{}'",
                LOG_LEVELS,
                self.general.log_level
            );
        }

        if self.table.default_range_days == 0 {
            bail!("default_range_days must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.picker.timezone, "Asia/Calcutta");
        assert_eq!(config.picker.max_past_days, 90);
        assert_eq!(config.table.default_range_days, 7);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
            [picker]
            timezone = "Europe/Berlin"
            max_past_days = -1

            [table]
            initial_sort_direction = "descending"
            "#,
        )
        .unwrap();
        assert_eq!(config.picker.timezone, "Europe/Berlin");
        assert_eq!(config.picker.max_past_days, -1);
        assert_eq!(config.picker.placeholder, "Select Registration Dates");
        assert_eq!(config.table.initial_sort_direction, SortDirection::Descending);
        assert_eq!(config.table.initial_sort_key.as_deref(), Some("name"));
        assert_eq!(config.general.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.picker.timezone = "Middle/Earth".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.general.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.table.default_range_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }
}
