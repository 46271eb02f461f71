use std::time::Duration;

use tracing::debug;

use super::ConfigError;
use crate::domain::Catalog;

pub const ENV_ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
pub const ENV_COUNTING_PATH: &str = "COUNTING_PATH";
pub const ENV_COUNT_TYPE: &str = "COUNT_TYPE";
pub const ENV_PRINTER_HOSTNAME: &str = "PRINTER_HOSTNAME";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_DENOMINATIONS: &str = "DENOMINATIONS";

pub const DEFAULT_COUNTING_PATH: &str = "/count/";
pub const DEFAULT_COUNT_TYPE: &str = "cash_count";
pub const DEFAULT_PRINTER_HOSTNAME: &str = "bar-printer";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for talking to the accounting API.
#[derive(Debug, Clone)]
pub struct Config {
    pub access_token: String,
    pub api_base_url: String,
    pub counting_path: String,
    pub count_type: String,
    pub printer_hostname: String,
    pub timeout: Duration,
    pub catalog: Catalog,
}

impl Config {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let access_token =
            get(ENV_ACCESS_TOKEN).ok_or(ConfigError::MissingVariable(ENV_ACCESS_TOKEN))?;
        let api_base_url = get(ENV_API_BASE_URL)
            .ok_or(ConfigError::MissingVariable(ENV_API_BASE_URL))?
            .trim_end_matches('/')
            .to_string();
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                name: ENV_API_BASE_URL,
                value: api_base_url,
                reason: "expected an http:// or https:// URL".into(),
            });
        }

        let timeout = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_TIMEOUT,
        };

        let config = Self {
            access_token,
            api_base_url,
            counting_path: get(ENV_COUNTING_PATH)
                .unwrap_or_else(|| DEFAULT_COUNTING_PATH.to_string()),
            count_type: get(ENV_COUNT_TYPE).unwrap_or_else(|| DEFAULT_COUNT_TYPE.to_string()),
            printer_hostname: get(ENV_PRINTER_HOSTNAME)
                .unwrap_or_else(|| DEFAULT_PRINTER_HOSTNAME.to_string()),
            timeout,
            catalog: catalog_from_lookup(&lookup)?,
        };
        debug!(
            base_url = %config.api_base_url,
            counting_path = %config.counting_path,
            count_type = %config.count_type,
            "loaded configuration"
        );
        Ok(config)
    }

    /// Full URL of the counting endpoint.
    pub fn counting_url(&self) -> String {
        let path = self.counting_path.trim_start_matches('/');
        format!("{}/{}", self.api_base_url, path)
    }
}

/// Catalog from `DENOMINATIONS`, or the default till catalog.
/// Usable without API credentials.
pub fn catalog_from_lookup<F>(lookup: F) -> Result<Catalog, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(ENV_DENOMINATIONS).filter(|v| !v.trim().is_empty()) {
        Some(list) => Ok(Catalog::parse(&list)?),
        None => Ok(Catalog::default()),
    }
}

pub fn catalog_from_env() -> Result<Catalog, ConfigError> {
    catalog_from_lookup(|name| std::env::var(name).ok())
}

/// Count type from `COUNT_TYPE`, or the default tag.
pub fn count_type_from_env() -> String {
    std::env::var(ENV_COUNT_TYPE)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_COUNT_TYPE.to_string())
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            name: ENV_HTTP_TIMEOUT_SECS,
            value: raw.to_string(),
            reason: "expected a positive number of seconds".into(),
        }),
    }
}
