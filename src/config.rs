use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://hn.algolia.com/api/v1";
pub const DEFAULT_QUERY: &str = "redux";
pub const DEFAULT_HITS_PER_PAGE: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub default_query: String,
    pub hits_per_page: u32,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_query: DEFAULT_QUERY.to_string(),
            hits_per_page: DEFAULT_HITS_PER_PAGE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Reads `.env` if present, then the `HN_SEARCH_*` variables. Anything
    /// unset falls back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("HN_SEARCH_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let default_query = lookup("HN_SEARCH_DEFAULT_QUERY").unwrap_or(defaults.default_query);
        let hits_per_page = parse_var(&lookup, "HN_SEARCH_HITS_PER_PAGE")?
            .unwrap_or(defaults.hits_per_page);
        let timeout = parse_var::<u64, _>(&lookup, "HN_SEARCH_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        if hits_per_page == 0 {
            return Err(ConfigError::Invalid {
                name: "HN_SEARCH_HITS_PER_PAGE",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            base_url,
            default_query,
            hits_per_page,
            timeout,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: format!("{raw:?}: {e}"),
            }),
        None => Ok(None),
    }
}
