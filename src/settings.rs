use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";
const DEFAULT_CONFIG_FILE: &str = "bank_etl.toml";
const ENV_PREFIX: &str = "BANKS";

/// Run settings. Every field has a default so an empty source is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source_url: String,
    pub table_selector: String,
    pub fetch_timeout_secs: u64,
    pub exchange_rate_path: PathBuf,
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub chart_dir: PathBuf,
    pub log_path: PathBuf,
    pub top_n: usize,
    pub inr_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            source_url: SOURCE_URL.to_string(),
            table_selector: "table.wikitable".to_string(),
            fetch_timeout_secs: 30,
            exchange_rate_path: PathBuf::from("exchange_rate.csv"),
            csv_path: PathBuf::from("data/transformed_banks_data.csv"),
            db_path: PathBuf::from("data/banks.db"),
            table_name: "banks".to_string(),
            chart_dir: PathBuf::from("data/charts"),
            log_path: PathBuf::from("data/etl_process.log"),
            top_n: 5,
            inr_threshold: 5000.0,
        }
    }
}

impl Settings {
    /// Layer defaults, an optional TOML file and `BANKS_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.table_name.is_empty()
            || !self
                .table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            anyhow::bail!("table_name must be a non-empty identifier, got {:?}", self.table_name);
        }
        if self.top_n == 0 {
            anyhow::bail!("top_n must be at least 1");
        }
        if !self.inr_threshold.is_finite() {
            anyhow::bail!("inr_threshold must be finite");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let s = Settings::default();
        assert_eq!(s.table_selector, "table.wikitable");
        assert_eq!(s.top_n, 5);
        assert_eq!(s.inr_threshold, 5000.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etl.toml");
        std::fs::write(&path, "table_name = \"banks_test\"\ntop_n = 3\n").unwrap();
        let s = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(s.table_name, "banks_test");
        assert_eq!(s.top_n, 3);
        assert_eq!(s.db_path, PathBuf::from("data/banks.db"));
    }

    #[test]
    fn rejects_unsafe_table_name() {
        let s = Settings {
            table_name: "banks; DROP TABLE x".to_string(),
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }
}
