use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub cors_allow_origin: Option<String>,
    pub summary: SummaryConfig,
}

/// Knobs for the dashboard summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryConfig {
    pub top_performers: usize,
    pub trailing_months: u32,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            top_performers: 5,
            trailing_months: 12,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = SummaryConfig::default();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 8080)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN")
                .ok()
                .filter(|origin| !origin.trim().is_empty()),
            summary: SummaryConfig {
                top_performers: parse_or_default("TOP_PERFORMERS_LIMIT", defaults.top_performers)?,
                trailing_months: parse_or_default(
                    "MONTHLY_WINDOW_MONTHS",
                    defaults.trailing_months,
                )?,
            },
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
