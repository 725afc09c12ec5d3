use crate::store::DEFAULT_PAGE_SIZE;
use std::path::PathBuf;

pub const ENV_WORKSPACE: &str = "SUNGJUKD_WORKSPACE";
pub const ENV_LOG: &str = "SUNGJUKD_LOG";
pub const ENV_PAGE_SIZE: &str = "SUNGJUKD_PAGE_SIZE";
pub const DEFAULT_LOG_FILTER: &str = "sungjukd=info";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Workspace opened before the first request, if any.
    pub workspace: Option<PathBuf>,
    pub log_filter: String,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let workspace = non_empty(ENV_WORKSPACE).map(PathBuf::from);
        let log_filter = non_empty(ENV_LOG)
            .or_else(|| non_empty("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        // Unparseable or zero sizes fall back to the default.
        let page_size = non_empty(ENV_PAGE_SIZE)
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            workspace,
            log_filter,
            page_size,
        }
    }
}
