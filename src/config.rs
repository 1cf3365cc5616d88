use chrono::{Duration, Local, NaiveDate};
use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_RECENT_WINDOW_DAYS, MAX_RECENT_WINDOW_DAYS, MN_FIRST_DECADE, MN_LAST_DECADE,
};

/// Identifiers of one station across the upstream feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationConfig {
    /// GHCN-Daily id; also the canonical station id of merged rows
    #[validate(length(min = 1))]
    pub ghcn_id: String,

    /// GSOD `USAF-WBAN` id
    #[validate(length(min = 1))]
    pub gsod_id: String,

    /// NWS forecast office for CF6 monthly summaries
    #[serde(default)]
    pub wfo: Option<String>,

    /// NWS station id within the forecast office
    #[serde(default)]
    pub nws_sid: Option<String>,

    /// Whether the university decade tables cover this station
    #[serde(default)]
    pub mn_climate: bool,
}

impl StationConfig {
    /// Forecast office and station id, when both are configured.
    pub fn nws_ids(&self) -> Option<(&str, &str)> {
        match (&self.wfo, &self.nws_sid) {
            (Some(wfo), Some(sid)) => Some((wfo.as_str(), sid.as_str())),
            _ => None,
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            ghcn_id: "USW00014922".to_string(),
            gsod_id: "726580-14922".to_string(),
            wfo: Some("MPX".to_string()),
            nws_sid: Some("MSP".to_string()),
            mn_climate: true,
        }
    }
}

/// Run configuration, built once and passed by reference into readers, the
/// recency filter and the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RunConfig {
    #[validate(length(min = 1), nested)]
    pub stations: Vec<StationConfig>,

    /// "Today" for the run; anchors the recency window
    pub run_date: NaiveDate,

    /// Days before `run_date` still considered recent
    #[validate(range(min = 0, max = MAX_RECENT_WINDOW_DAYS))]
    pub recent_window_days: i64,

    /// Decades of the university climate tables to read
    pub mn_decades: Vec<i32>,

    /// Directory holding retrieved feed files
    pub data_dir: PathBuf,

    /// Snapshot file of the canonical store
    pub store_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            stations: vec![StationConfig::default()],
            run_date: Local::now().date_naive(),
            recent_window_days: DEFAULT_RECENT_WINDOW_DAYS,
            mn_decades: (MN_FIRST_DECADE..=MN_LAST_DECADE).step_by(10).collect(),
            data_dir: PathBuf::from("data"),
            store_path: PathBuf::from("data/observations.json"),
        }
    }
}

impl RunConfig {
    /// Load built-in defaults (one station: Minneapolis-St Paul airport),
    /// then `path` if given (TOML, YAML or JSON by extension), then
    /// `OBSMERGE__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&RunConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("OBSMERGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let run_config: RunConfig = config.try_deserialize()?;
        run_config.validate()?;
        Ok(run_config)
    }

    pub fn with_run_date(mut self, run_date: NaiveDate) -> Self {
        self.run_date = run_date;
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_store_path(mut self, store_path: impl Into<PathBuf>) -> Self {
        self.store_path = store_path.into();
        self
    }

    pub fn with_recent_window_days(mut self, days: i64) -> Self {
        self.recent_window_days = days;
        self
    }

    pub fn with_stations(mut self, stations: Vec<StationConfig>) -> Self {
        self.stations = stations;
        self
    }

    /// Earliest date a recent-mode run keeps; saturates at the earliest
    /// representable date for windows that were never validated.
    pub fn recent_cutoff(&self) -> NaiveDate {
        Duration::try_days(self.recent_window_days)
            .and_then(|window| self.run_date.checked_sub_signed(window))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn station(&self, ghcn_id: &str) -> Result<&StationConfig> {
        self.stations
            .iter()
            .find(|s| s.ghcn_id == ghcn_id)
            .ok_or_else(|| ProcessingError::Config(format!("Unknown station: {}", ghcn_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Serializes tests that read the process environment through `load`
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_are_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.recent_window_days, 30);
        assert_eq!(config.mn_decades.first(), Some(&1870));
        assert_eq!(config.mn_decades.last(), Some(&2000));
        assert_eq!(config.mn_decades.len(), 14);
    }

    #[test]
    fn test_recent_cutoff() {
        let config = RunConfig::default()
            .with_run_date(NaiveDate::from_ymd_opt(2014, 6, 15).unwrap());
        assert_eq!(
            config.recent_cutoff(),
            NaiveDate::from_ymd_opt(2014, 5, 16).unwrap()
        );
    }

    #[test]
    fn test_empty_station_list_is_rejected() {
        let config = RunConfig::default().with_stations(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            r#"
run_date = "2014-06-15"
recent_window_days = 10
data_dir = "/var/feeds"

[[stations]]
ghcn_id = "USW00094846"
gsod_id = "725300-94846"
"#
        )?;

        let config = RunConfig::load(Some(file.path()))?;
        assert_eq!(config.recent_window_days, 10);
        assert_eq!(config.data_dir, PathBuf::from("/var/feeds"));
        assert_eq!(config.stations.len(), 1);
        assert_eq!(config.stations[0].ghcn_id, "USW00094846");
        assert_eq!(
            config.recent_cutoff(),
            NaiveDate::from_ymd_opt(2014, 6, 5).unwrap()
        );
        Ok(())
    }

    #[test]
    fn test_oversized_window_is_rejected_without_panic() {
        let config = RunConfig::default()
            .with_run_date(NaiveDate::from_ymd_opt(2014, 6, 15).unwrap())
            .with_recent_window_days(200_000_000);
        assert!(config.validate().is_err());
        assert_eq!(config.recent_cutoff(), NaiveDate::MIN);

        let config = config.with_recent_window_days(MAX_RECENT_WINDOW_DAYS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides_window() -> Result<()> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("OBSMERGE__RECENT_WINDOW_DAYS", "5");
        let loaded = RunConfig::load(None);
        std::env::remove_var("OBSMERGE__RECENT_WINDOW_DAYS");

        assert_eq!(loaded?.recent_window_days, 5);
        Ok(())
    }

    #[test]
    fn test_nws_ids_need_both_parts() {
        let mut station = StationConfig::default();
        assert_eq!(station.nws_ids(), Some(("MPX", "MSP")));

        station.nws_sid = None;
        assert_eq!(station.nws_ids(), None);
    }

    #[test]
    fn test_station_lookup() {
        let config = RunConfig::default();
        assert!(config.station("USW00014922").is_ok());
        assert!(config.station("USW00000000").is_err());
    }
}
