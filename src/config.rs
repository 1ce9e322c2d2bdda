//! Run configuration.
//!
//! Optionally stored as a JSON file on disk; every field has a default so a
//! partial file is fine:
//! ```json
//! {
//!   "stations": "reference/stations_base.csv",
//!   "structure": "reference/structure.csv",
//!   "directions": [24602, 24603, 24701],
//!   "sheet_label": "Оценка КМ"
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::inspection::DEFAULT_SHEET_LABEL;

pub const DEFAULT_STATIONS: &str = "stations_base.csv";
pub const DEFAULT_DIRECTIONS: &[i64] = &[24602, 24603, 24701];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RaterConfig {
    /// Station reference source
    pub stations: String,
    /// Administrative structure source, needed only by the integrity check
    pub structure: Option<String>,
    /// Directions to process; others are ignored
    pub directions: Vec<i64>,
    /// Workbook sheet holding per-kilometer grades
    pub sheet_label: String,
}

impl Default for RaterConfig {
    fn default() -> Self {
        Self {
            stations: DEFAULT_STATIONS.to_string(),
            structure: None,
            directions: DEFAULT_DIRECTIONS.to_vec(),
            sheet_label: DEFAULT_SHEET_LABEL.to_string(),
        }
    }
}

impl RaterConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("cannot read config {path}"))?;
        serde_json::from_str(&content).with_context(|| format!("invalid config {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = RaterConfig::default();
        assert_eq!(config.stations, "stations_base.csv");
        assert_eq!(config.directions, vec![24602, 24603, 24701]);
        assert_eq!(config.sheet_label, "Оценка КМ");
        assert!(config.structure.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RaterConfig = serde_json::from_str(r#"{"directions": [1, 2]}"#).unwrap();
        assert_eq!(config.directions, vec![1, 2]);
        assert_eq!(config.stations, DEFAULT_STATIONS);
    }

    #[test]
    fn test_load_from_file() {
        let path = format!("{}/track_rater_config_test.json", env::temp_dir().display());
        fs::write(&path, r#"{"stations": "s.csv", "structure": "pch.csv"}"#).unwrap();

        let config = RaterConfig::load(&path).unwrap();
        assert_eq!(config.stations, "s.csv");
        assert_eq!(config.structure.as_deref(), Some("pch.csv"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_invalid_json() {
        let path = format!("{}/track_rater_config_bad.json", env::temp_dir().display());
        fs::write(&path, "{not json").unwrap();
        assert!(RaterConfig::load(&path).is_err());
        fs::remove_file(&path).unwrap();
    }
}
