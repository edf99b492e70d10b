//! Configuration management for famhub.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `FAMHUB_DB` - Optional. SQLite database path. Defaults to `famhub.db`.
//! - `CRON_SECRET` - Optional. Bearer secret protecting the reminder
//!   trigger endpoint. Defaults to `famhub-cron`.
//! - `XAI_API_KEY` - Optional. Enables the AI coach; without it, suggest
//!   and coach endpoints serve static fallbacks.
//! - `TZ_OFFSET_MINUTES` - Optional. Canonical timezone as a fixed UTC
//!   offset in minutes, used for all reminder date math. Defaults to `0`.
//! - `REMINDER_DUE_SOON_MINUTES` - Optional. Defaults to `15`.
//! - `REMINDER_OVERDUE_LOOKBACK_MINUTES` - Optional. Defaults to `30`.

use chrono::FixedOffset;
use std::path::PathBuf;
use thiserror::Error;

use crate::reminder::ReminderWindows;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// SQLite database path
    pub db_path: PathBuf,

    /// Shared secret for the cron-driven reminder trigger
    pub cron_secret: String,

    /// x.ai API key for the coach collaborator
    pub xai_api_key: Option<String>,

    /// Canonical timezone offset from UTC, in minutes
    pub tz_offset_minutes: i32,

    /// Reminder eligibility windows
    pub reminders: ReminderWindows,
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string(), raw)),
        Err(_) => Ok(None),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let tz_offset_minutes: i32 = env_parse("TZ_OFFSET_MINUTES")?.unwrap_or(0);
        if tz_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidValue(
                "TZ_OFFSET_MINUTES".to_string(),
                tz_offset_minutes.to_string(),
            ));
        }

        let mut reminders = ReminderWindows::default();
        if let Some(minutes) = env_parse("REMINDER_DUE_SOON_MINUTES")? {
            reminders.due_soon_minutes = minutes;
        }
        if let Some(minutes) = env_parse("REMINDER_OVERDUE_LOOKBACK_MINUTES")? {
            reminders.overdue_lookback_minutes = minutes;
        }

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("PORT")?.unwrap_or(3000),
            db_path: std::env::var("FAMHUB_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("famhub.db")),
            cron_secret: std::env::var("CRON_SECRET")
                .unwrap_or_else(|_| "famhub-cron".to_string()),
            xai_api_key: std::env::var("XAI_API_KEY").ok().filter(|k| !k.is_empty()),
            tz_offset_minutes,
            reminders,
        })
    }

    /// The pinned canonical timezone for reminder evaluation.
    pub fn tz_offset(&self) -> FixedOffset {
        // Range-checked in from_env; east_opt only fails outside +/-24h.
        FixedOffset::east_opt(self.tz_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            db_path: PathBuf::from("famhub.db"),
            cron_secret: "famhub-cron".to_string(),
            xai_api_key: None,
            tz_offset_minutes: 0,
            reminders: ReminderWindows::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_utc() {
        let config = Config::default();
        assert_eq!(config.tz_offset().local_minus_utc(), 0);
        assert_eq!(config.reminders.due_soon_minutes, 15);
        assert_eq!(config.reminders.overdue_lookback_minutes, 30);
    }

    #[test]
    fn tz_offset_converts_minutes() {
        let config = Config {
            tz_offset_minutes: 120,
            ..Config::default()
        };
        assert_eq!(config.tz_offset().local_minus_utc(), 2 * 3600);
    }
}
