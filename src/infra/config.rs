//! Centralized configuration (environment variables + defaults).

use crate::app::export::DEFAULT_EXPORT_PATH;
use crate::app::recalculate::DEFAULT_WORKERS;
use anyhow::Context;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_retries: u32,
    pub db_connect_retry_delay: Duration,
    pub bind_addr: String,
    pub recalc_workers: usize,
    /// `None` disables the periodic recalculation task.
    pub recalc_interval: Option<Duration>,
    pub export_path: PathBuf,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Reads the process environment after loading `.env`, if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let interval_secs: u64 = parse_or(&get, "RECALC_INTERVAL_SECS", 0)?;

        Ok(Self {
            database_url,
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 5)?,
            db_connect_retries: parse_or(&get, "DB_CONNECT_RETRIES", 5)?,
            db_connect_retry_delay: Duration::from_secs(parse_or(
                &get,
                "DB_CONNECT_RETRY_DELAY_SECS",
                5,
            )?),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            recalc_workers: parse_or::<usize, _>(&get, "RECALC_WORKERS", DEFAULT_WORKERS)?.max(1),
            recalc_interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
            export_path: get("EXPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH)),
            log_format: match get("LOG_FORMAT") {
                Some(v) => v.parse()?,
                None => LogFormat::Pretty,
            },
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(cfg.db_max_connections, 5);
        assert_eq!(cfg.db_connect_retries, 5);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.recalc_workers, 10);
        assert_eq!(cfg.recalc_interval, None);
        assert_eq!(cfg.export_path, PathBuf::from("/tmp/restaurant_ratings.csv"));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn database_url_is_required() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).is_err());
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("RECALC_WORKERS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("RECALC_WORKERS"));
    }

    #[test]
    fn overrides_are_read() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("RECALC_WORKERS", "3"),
            ("RECALC_INTERVAL_SECS", "600"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(cfg.recalc_workers, 3);
        assert_eq!(cfg.recalc_interval, Some(Duration::from_secs(600)));
        assert_eq!(cfg.log_format, LogFormat::Json);
    }
}
