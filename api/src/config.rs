//! Centralized configuration management.
//!
//! Scan and move tunables can be overridden through environment variables.
//! Invalid values are logged and replaced by the defaults instead of
//! aborting start-up.

use std::{str::FromStr, time::Duration};

use osuverse::{MovePolicy, ScanConfig};
use tracing::warn;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Batching, throttling and time budget for scans
    pub scan: ScanConfig,
    /// Behaviour when one folder of a move request fails (default: stop)
    pub move_policy: MovePolicy,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `OSUVERSE_BATCH_SIZE` | 50 |
    /// | `OSUVERSE_PROGRESS_INTERVAL_MS` | 1000 |
    /// | `OSUVERSE_SCAN_TIMEOUT_SECS` | 300 |
    /// | `OSUVERSE_PARTIAL_ON_TIMEOUT` | false |
    /// | `OSUVERSE_MOVE_POLICY` | `stop` (`continue` also accepted) |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ScanConfig::default();

        let scan = ScanConfig::new()
            .batch_size(parse_or(&lookup, "OSUVERSE_BATCH_SIZE", defaults.batch_size))
            .progress_interval(Duration::from_millis(parse_or(
                &lookup,
                "OSUVERSE_PROGRESS_INTERVAL_MS",
                defaults.progress_interval.as_millis() as u64,
            )))
            .timeout(Duration::from_secs(parse_or(
                &lookup,
                "OSUVERSE_SCAN_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )))
            .partial_on_timeout(flag(&lookup, "OSUVERSE_PARTIAL_ON_TIMEOUT"));

        Self {
            scan,
            move_policy: parse_or(&lookup, "OSUVERSE_MOVE_POLICY", MovePolicy::default()),
        }
    }

    pub fn scan(&self) -> &ScanConfig {
        &self.scan
    }

    pub fn move_policy(&self) -> MovePolicy {
        self.move_policy
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring invalid {}={:?}: {}", key, raw, e);
            default
        }
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> bool {
    lookup(key).is_some_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
