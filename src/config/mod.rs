use crate::utils::error::{DispatchError, Result};
use crate::utils::validation::{validate_positive_number, validate_url, Validate};
use std::time::Duration;

const DEFAULT_FETCH_URL: &str = "https://jsonplaceholder.typicode.com/users";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "DEV" => Ok(Environment::Dev),
            "PROD" => Ok(Environment::Prod),
            other => Err(DispatchError::InvalidConfigValue {
                field: "ENV".to_string(),
                value: other.to_string(),
                reason: "Expected DEV or PROD".to_string(),
            }),
        }
    }
}

/// Runtime configuration, sourced from the process environment with a `.env`
/// file loaded first (the real environment wins over the file).
#[derive(Debug, Clone)]
pub struct Config {
    pub env: Environment,
    /// Upstream endpoint serving the JSON array of users (API A).
    pub fetch_url: String,
    /// Downstream endpoint receiving one `{name, email}` object per POST (API B).
    pub send_url: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lookup is injected so tests never have to mutate the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = match lookup("ENV") {
            Some(value) => Environment::parse(&value)?,
            None => Environment::Dev,
        };

        let fetch_url = lookup("API_A_URL").unwrap_or_else(|| DEFAULT_FETCH_URL.to_string());

        let send_url = lookup("API_B_URL").ok_or_else(|| DispatchError::MissingConfig {
            field: "API_B_URL".to_string(),
        })?;

        let max_retries = parse_number(&lookup, "MAX_RETRIES", DEFAULT_MAX_RETRIES)?;
        let retry_delay_ms = parse_number(&lookup, "RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS)?;
        let timeout_secs = parse_number(&lookup, "TIMEOUT", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            env,
            fetch_url,
            send_url,
            max_retries,
            retry_delay_ms,
            timeout_secs,
        })
    }

    /// Base delay between delivery retries, before backoff scaling.
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Timeout applied to each individual upstream/downstream call.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_number<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e| DispatchError::InvalidConfigValue {
            field: key.to_string(),
            value: raw.clone(),
            reason: format!("Not a valid number: {}", e),
        }),
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<()> {
        validate_url("API_A_URL", &self.fetch_url)?;
        validate_url("API_B_URL", &self.send_url)?;
        validate_positive_number("MAX_RETRIES", self.max_retries as u64, 1)?;
        validate_positive_number("TIMEOUT", self.timeout_secs, 1)?;
        Ok(())
    }
}
