use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 35248;
const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 60 * 60;
const STORAGE_FILE_NAME: &str = ".gondolaBookmarks.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_host: String,
    /// Time between persistence attempts
    pub flush_interval: Duration,
    pub storage_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parse_or_default(&lookup, "BOOKMARK_PORT", DEFAULT_PORT);

        let bind_host = lookup("BOOKMARK_BIND_HOST")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());

        let mut flush_secs = parse_or_default(
            &lookup,
            "BOOKMARK_FLUSH_INTERVAL_SECS",
            DEFAULT_FLUSH_INTERVAL_SECS,
        );
        if flush_secs == 0 {
            log::warn!(
                "[BOOKMARKS] BOOKMARK_FLUSH_INTERVAL_SECS must be positive, using {}",
                DEFAULT_FLUSH_INTERVAL_SECS
            );
            flush_secs = DEFAULT_FLUSH_INTERVAL_SECS;
        }

        let storage_path = lookup("BOOKMARK_STORAGE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_path);

        Self {
            port,
            bind_host,
            flush_interval: Duration::from_secs(flush_secs),
            storage_path,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

fn parse_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("[BOOKMARKS] Invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}

fn default_storage_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(STORAGE_FILE_NAME),
        None => {
            log::warn!("[BOOKMARKS] No home directory found, storing bookmarks in the working directory");
            PathBuf::from(".").join(STORAGE_FILE_NAME)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_with(&[]);
        assert_eq!(config.port, 35248);
        assert_eq!(config.bind_host, "0.0.0.0");
        assert_eq!(config.flush_interval, Duration::from_secs(3600));
        assert!(config.storage_path.ends_with(".gondolaBookmarks.json"));
    }

    #[test]
    fn reads_overrides() {
        let config = config_with(&[
            ("BOOKMARK_PORT", "9200"),
            ("BOOKMARK_BIND_HOST", "127.0.0.1"),
            ("BOOKMARK_FLUSH_INTERVAL_SECS", "30"),
            ("BOOKMARK_STORAGE_PATH", "/tmp/marks.json"),
        ]);
        assert_eq!(config.bind_addr(), "127.0.0.1:9200");
        assert_eq!(config.flush_interval, Duration::from_secs(30));
        assert_eq!(config.storage_path, PathBuf::from("/tmp/marks.json"));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_with(&[
            ("BOOKMARK_PORT", "not-a-port"),
            ("BOOKMARK_FLUSH_INTERVAL_SECS", "0"),
        ]);
        assert_eq!(config.port, 35248);
        assert_eq!(config.flush_interval, Duration::from_secs(3600));
    }
}
