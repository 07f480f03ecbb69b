use std::{env, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_ADVISORY_ENDPOINT: &str = "http://127.0.0.1:3000/api/ai_completion";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub advisory_endpoint: String,
    pub advisory_timeout: Duration,
    pub save_debounce: Duration,
    pub motivation_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            advisory_endpoint: DEFAULT_ADVISORY_ENDPOINT.to_string(),
            advisory_timeout: Duration::from_secs(10),
            save_debounce: Duration::from_millis(300),
            motivation_interval: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Reads overrides from the environment; unset or unparseable values keep
    /// their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            data_dir: lookup("APP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            advisory_endpoint: lookup("ADVISORY_ENDPOINT").unwrap_or(defaults.advisory_endpoint),
            advisory_timeout: parsed(&lookup, "ADVISORY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.advisory_timeout),
            save_debounce: parsed(&lookup, "SAVE_DEBOUNCE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.save_debounce),
            motivation_interval: parsed::<u64>(&lookup, "MOTIVATION_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.motivation_interval),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}
