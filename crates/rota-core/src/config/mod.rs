use anyhow::Result;
use chrono_tz::Tz;
use config::Config;
use serde::Deserialize;

use crate::constants::{DEFAULT_REPEAT_SPAN_DAYS, MAX_REPEAT_SPAN_DAYS};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub scheduling: SchedulingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// IANA zone used for rules synthesized when repeat is first enabled.
    pub default_timezone: String,
    /// Days between a default rule's start and its `UNTIL` bound.
    pub repeat_span_days: u16,
}

impl SchedulingConfig {
    /// ## Summary
    /// Resolves the configured default timezone.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if the name is not a known IANA zone.
    pub fn timezone(&self) -> CoreResult<Tz> {
        self.default_timezone.parse::<Tz>().map_err(|err| {
            CoreError::ConfigError(format!(
                "unknown timezone '{}': {err}",
                self.default_timezone
            ))
        })
    }

    /// ## Summary
    /// Returns the repeat span in days, rejecting zero and spans beyond a year.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if the span is out of range.
    pub fn repeat_span(&self) -> CoreResult<chrono::Days> {
        if self.repeat_span_days == 0 || self.repeat_span_days > MAX_REPEAT_SPAN_DAYS {
            return Err(CoreError::ConfigError(format!(
                "scheduling.repeat_span_days must be within 1..={MAX_REPEAT_SPAN_DAYS}, got {}",
                self.repeat_span_days
            )));
        }
        Ok(chrono::Days::new(u64::from(self.repeat_span_days)))
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
            repeat_span_days: DEFAULT_REPEAT_SPAN_DAYS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from defaults, environment variables and an optional
    /// `rota.toml` into a `Settings`.
    ///
    /// Environment variables use the `ROTA__` prefix and `__` as the section
    /// separator, e.g. `ROTA__SCHEDULING__DEFAULT_TIMEZONE=Australia/Sydney`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("scheduling.default_timezone", "UTC")?
            .set_default(
                "scheduling.repeat_span_days",
                i64::from(DEFAULT_REPEAT_SPAN_DAYS),
            )?
            .set_default("logging.level", "info")?
            .add_source(
                config::Environment::with_prefix("ROTA")
                    .prefix_separator("__")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("rota.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    settings.scheduling.timezone()?;
    settings.scheduling.repeat_span()?;
    tracing::debug!(settings = ?settings, "Configuration validated");
    Ok(settings)
}
