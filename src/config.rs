use std::{env, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// API root every request path is appended to.
    pub base_url: String,
    pub timeout: Duration,
    /// JSON file standing in for the browser's local storage.
    pub state_file: Option<PathBuf>,
    /// JSON file the cookie jar is persisted to between runs.
    pub cookie_file: Option<PathBuf>,
    pub poll_interval: Duration,
    pub poll_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            state_file: None,
            cookie_file: None,
            poll_interval: Duration::from_secs(5),
            poll_attempts: 12,
        }
    }
}

fn parse_var<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Defaults overridden by `STREAMLINE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(url) = env::var("STREAMLINE_API_URL") {
            config.base_url = url;
        }
        if let Some(ms) = parse_var::<u64>("STREAMLINE_TIMEOUT_MS")? {
            config.timeout = Duration::from_millis(ms);
        }
        if let Ok(path) = env::var("STREAMLINE_STATE_FILE") {
            config.state_file = Some(PathBuf::from(path));
        }
        if let Ok(path) = env::var("STREAMLINE_COOKIE_FILE") {
            config.cookie_file = Some(PathBuf::from(path));
        }
        if let Some(ms) = parse_var::<u64>("STREAMLINE_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<u32>("STREAMLINE_POLL_ATTEMPTS")? {
            config.poll_attempts = n;
        }

        Ok(config)
    }
}
