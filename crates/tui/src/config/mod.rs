use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, ValueEnum};
use engine::{EditorOptions, Period};
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/tui.toml";

/// Where expenses come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// In-process sample data, nothing leaves the terminal.
    Memory,
    /// The REST API at `base_url`.
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: Source,
    pub base_url: String,
    /// Month opened at start (`YYYY-MM`), the current month when unset.
    pub period: Option<String>,
    pub timezone: String,
    pub edit_quiet_ms: u64,
    pub search_quiet_ms: u64,
    pub payoff_reload_ms: u64,
    pub undo_depth: usize,
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: Source::Http,
            base_url: "http://127.0.0.1:3000".to_string(),
            period: None,
            timezone: "America/Chicago".to_string(),
            edit_quiet_ms: 500,
            search_quiet_ms: 1000,
            payoff_reload_ms: 1000,
            undo_depth: 100,
            log_file: None,
        }
    }
}

impl AppConfig {
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            edit_quiet_period: Duration::from_millis(self.edit_quiet_ms),
            search_quiet_period: Duration::from_millis(self.search_quiet_ms),
            reload_delay: Duration::from_millis(self.payoff_reload_ms),
            undo_depth: self.undo_depth,
        }
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|err| {
            AppError::Config(config::ConfigError::Message(format!(
                "invalid timezone {}: {err}",
                self.timezone
            )))
        })
    }

    /// The configured month, or the month of `today`.
    pub fn period(&self, today: NaiveDate) -> Result<Period> {
        match self.period.as_deref() {
            Some(period) => period.parse::<Period>().map_err(|err| {
                AppError::Config(config::ConfigError::Message(err.to_string()))
            }),
            None => Ok(Period::containing(today)),
        }
    }
}

/// Current date in `tz`.
pub fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

#[derive(Debug, Parser)]
#[command(name = "tally_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:3000).
    #[arg(long)]
    base_url: Option<String>,
    /// Override the data source.
    #[arg(long, value_enum)]
    source: Option<Source>,
    /// Month to open (YYYY-MM).
    #[arg(long)]
    period: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("TALLY_TUI"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(source) = args.source {
        settings.source = source;
    }
    if let Some(period) = args.period {
        settings.period = Some(period);
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.editor_options(), EditorOptions::default());
        assert_eq!(config.source, Source::Http);
    }

    #[test]
    fn reads_toml_values() {
        let settings: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "source = \"memory\"\nperiod = \"2026-01\"\nedit_quiet_ms = 250",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.source, Source::Memory);
        assert_eq!(settings.edit_quiet_ms, 250);
        assert_eq!(settings.search_quiet_ms, 1000);

        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(settings.period(today).unwrap().to_string(), "2026-01");
    }

    #[test]
    fn period_defaults_to_current_month() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let period = AppConfig::default().period(today).unwrap();
        assert_eq!(period.to_string(), "2026-03");
    }

    #[test]
    fn rejects_unknown_timezone() {
        let config = AppConfig {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(config.timezone().is_err());
        assert!(AppConfig::default().timezone().is_ok());
    }
}
