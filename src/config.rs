//! Application configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `STOCKSCOPE_*` environment variables (nested keys use `__`, e.g.
//! `STOCKSCOPE_PAGE__WIDTH=1600`).

use crate::charts::DEFAULT_HISTOGRAM_BUCKETS;
use crate::errors::{AnalysisError, Result};
use crate::period::Period;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "stockscope.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "STOCKSCOPE";

/// Instrument analyzed when the user enters a blank symbol
pub const DEFAULT_SYMBOL: &str = "RELIANCE.NS";

/// Colour scheme applied to rendered pages
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSchemeKind {
    #[default]
    Traditional,
    Dark,
    HighContrast,
}

/// Output page geometry and styling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub width: u32,
    pub height: u32,
    pub color_scheme: ColorSchemeKind,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 1000,
            color_scheme: ColorSchemeKind::Traditional,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding `<SYMBOL>.csv` files
    pub data_dir: PathBuf,
    /// Directory receiving rendered pages
    pub output_dir: PathBuf,
    pub default_symbol: String,
    pub default_period: Period,
    pub histogram_buckets: usize,
    /// Filter directive used when `RUST_LOG` is not set
    pub log_level: String,
    pub page: PageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            default_symbol: DEFAULT_SYMBOL.to_string(),
            default_period: Period::OneYear,
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
            log_level: "info".to_string(),
            page: PageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path` (or [`DEFAULT_CONFIG_FILE`] when absent) plus the environment.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    pub(crate) fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: AppConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.histogram_buckets == 0 {
            return Err(AnalysisError::ConfigError {
                message: "histogram_buckets must be at least 1".to_string(),
            });
        }
        if self.page.width == 0 || self.page.height == 0 {
            return Err(AnalysisError::ConfigError {
                message: format!(
                    "page dimensions must be non-zero, got {}x{}",
                    self.page.width, self.page.height
                ),
            });
        }
        if self.default_symbol.trim().is_empty() {
            return Err(AnalysisError::ConfigError {
                message: "default_symbol must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const UNSET_PREFIX: &str = "STOCKSCOPE_TEST_UNSET_PREFIX";

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_symbol, "RELIANCE.NS");
        assert_eq!(config.default_period, Period::OneYear);
        assert_eq!(config.histogram_buckets, 30);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stockscope.toml");
        fs::write(
            &path,
            r#"
default_symbol = "INFY.NS"
default_period = "6M"

[page]
color_scheme = "dark"
"#,
        )
        .unwrap();

        let config = AppConfig::load_with_prefix(Some(&path), UNSET_PREFIX).unwrap();
        assert_eq!(config.default_symbol, "INFY.NS");
        assert_eq!(config.default_period, Period::SixMonths);
        assert_eq!(config.page.color_scheme, ColorSchemeKind::Dark);
        assert_eq!(config.page.width, PageConfig::default().width);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_zero_buckets_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "histogram_buckets = 0\n").unwrap();

        let err = AppConfig::load_with_prefix(Some(&path), UNSET_PREFIX).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError { .. }));
    }

    #[test]
    fn test_period_tokens_are_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lower.toml");
        fs::write(&path, "default_period = \"2y\"\n").unwrap();
        let config = AppConfig::load_with_prefix(Some(&path), UNSET_PREFIX).unwrap();
        assert_eq!(config.default_period, Period::TwoYears);

        let path = dir.path().join("unknown.toml");
        fs::write(&path, "default_period = \"10Y\"\n").unwrap();
        let err = AppConfig::load_with_prefix(Some(&path), UNSET_PREFIX).unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(AppConfig::load_with_prefix(Some(&path), UNSET_PREFIX).is_err());
    }

    #[test]
    fn test_zero_page_dimension_rejected() {
        let mut config = AppConfig::default();
        config.page.height = 0;
        assert!(config.validate().is_err());
    }
}
