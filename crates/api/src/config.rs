//! Process configuration from environment variables (and `.env`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use finanzas_core::{HouseholdId, Money};
use finanzas_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
pub const DEFAULT_PREFERENCES_PATH: &str = "data/preferences.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is required: {reason}")]
    Missing { var: &'static str, reason: &'static str },

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Hosted store credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStoreConfig {
    pub url: String,
    pub anon_key: String,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    /// Chat answers 500 when unset.
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub chat_max_tokens: u32,
    pub chat_timeout: Duration,
    /// In-memory store when unset.
    pub remote_store: Option<RemoteStoreConfig>,
    pub household_id: HouseholdId,
    pub monthly_income: Money,
    pub monthly_variable_budget: Money,
    pub preferences_path: PathBuf,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr: SocketAddr = parse_or("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?;
        let log_format: LogFormat = match get("LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|e: finanzas_observability::UnknownLogFormat| {
                ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    reason: e.to_string(),
                }
            })?,
            None => LogFormat::default(),
        };

        let chat_max_tokens: u32 = parse_or("CHAT_MAX_TOKENS", get("CHAT_MAX_TOKENS"), Some(1024))?;
        if chat_max_tokens == 0 {
            return Err(ConfigError::Invalid {
                var: "CHAT_MAX_TOKENS",
                reason: "must be positive".to_string(),
            });
        }
        let chat_timeout_secs: u64 = parse_or("CHAT_TIMEOUT_SECS", get("CHAT_TIMEOUT_SECS"), Some(30))?;

        let remote_store = match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => {
                let poll_secs: u64 = parse_or("STORE_POLL_SECS", get("STORE_POLL_SECS"), Some(30))?;
                Some(RemoteStoreConfig {
                    url,
                    anon_key,
                    poll_interval: Duration::from_secs(poll_secs.max(1)),
                })
            }
            (Some(_), None) => {
                return Err(ConfigError::Missing {
                    var: "SUPABASE_ANON_KEY",
                    reason: "needed when SUPABASE_URL is set",
                });
            }
            (None, _) => None,
        };

        let household_id: HouseholdId = match get("HOUSEHOLD_ID") {
            Some(raw) => raw.parse().map_err(|e: finanzas_core::DomainError| ConfigError::Invalid {
                var: "HOUSEHOLD_ID",
                reason: e.to_string(),
            })?,
            None if remote_store.is_some() => {
                return Err(ConfigError::Missing {
                    var: "HOUSEHOLD_ID",
                    reason: "rows in the hosted store are scoped by household",
                });
            }
            None => HouseholdId::new(),
        };

        Ok(Self {
            bind_addr,
            log_format,
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            anthropic_model: get("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            chat_max_tokens,
            chat_timeout: Duration::from_secs(chat_timeout_secs),
            remote_store,
            household_id,
            monthly_income: money("MONTHLY_INCOME", get("MONTHLY_INCOME"))?,
            monthly_variable_budget: money("MONTHLY_VARIABLE_BUDGET", get("MONTHLY_VARIABLE_BUDGET"))?,
            preferences_path: get("PREFERENCES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_PATH)),
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => default.ok_or(ConfigError::Missing {
            var,
            reason: "no default available",
        }),
    }
}

/// Amounts are given in major units, e.g. `15000` or `15000.50`.
fn money(var: &'static str, raw: Option<String>) -> Result<Money, ConfigError> {
    let value: f64 = parse_or(var, raw, Some(0.0))?;
    let amount = Money::from_major(value).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })?;
    if amount.is_negative() {
        return Err(ConfigError::Invalid {
            var,
            reason: "must not be negative".to_string(),
        });
    }
    Ok(amount)
}
