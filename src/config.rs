//! Run configuration and threshold environment variables.

use crate::error::{LoadTestError, LoadTestResult};
use std::fmt::Display;
use std::str::FromStr;

const COMPOSE_FAIL_RATIO_VAR: &str = "COMPOSE_LT_FAIL_RATIO";
const COMPOSE_P95_VAR: &str = "COMPOSE_LT_PERCENTILE_95_RESPONSE_TIME";
const FAIL_RATIO_VAR: &str = "LT_FAIL_RATIO";
const MEAN_VAR: &str = "LT_MEAN_RESPONSE_TIME";
const MEDIAN_VAR: &str = "LT_MEDIAN_RESPONSE_TIME";
const P95_VAR: &str = "LT_PERCENTILE_95_RESPONSE_TIME";

/// Latency and error-rate limits applied to the statistics at the end of a
/// run.
///
/// The compose endpoint has its own failure-ratio and p95 budget since
/// compose requests are not expected to have the same latencies as the rest
/// of the API; every other endpoint is checked against the default profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Max fraction of failed compose requests.
    pub compose_fail_ratio: f64,
    /// Max compose p95 latency in milliseconds.
    pub compose_p95_ms: f64,
    /// Max fraction of failed requests, non-compose.
    pub fail_ratio: f64,
    /// Max average latency in milliseconds, non-compose.
    pub mean_ms: f64,
    /// Max median latency in milliseconds, non-compose.
    pub median_ms: f64,
    /// Max p95 latency in milliseconds, non-compose.
    pub p95_ms: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            compose_fail_ratio: 0.01,
            compose_p95_ms: 6000.0,
            fail_ratio: 0.01,
            mean_ms: 200.0,
            median_ms: 280.0,
            p95_ms: 500.0,
        }
    }
}

impl Thresholds {
    /// Read thresholds from the process environment, falling back to the
    /// defaults for unset variables. Malformed values are errors, never
    /// silently defaulted.
    pub fn from_env() -> LoadTestResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read thresholds through an injected lookup function.
    pub fn from_lookup<F>(lookup: F) -> LoadTestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            compose_fail_ratio: parse_var(
                COMPOSE_FAIL_RATIO_VAR,
                lookup(COMPOSE_FAIL_RATIO_VAR),
                defaults.compose_fail_ratio,
            )?,
            compose_p95_ms: parse_var(
                COMPOSE_P95_VAR,
                lookup(COMPOSE_P95_VAR),
                defaults.compose_p95_ms,
            )?,
            fail_ratio: parse_var(FAIL_RATIO_VAR, lookup(FAIL_RATIO_VAR), defaults.fail_ratio)?,
            mean_ms: parse_var(MEAN_VAR, lookup(MEAN_VAR), defaults.mean_ms)?,
            median_ms: parse_var(MEDIAN_VAR, lookup(MEDIAN_VAR), defaults.median_ms)?,
            p95_ms: parse_var(P95_VAR, lookup(P95_VAR), defaults.p95_ms)?,
        })
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>, default: T) -> LoadTestResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(err) => Err(LoadTestError::InvalidThreshold {
                var,
                value: raw,
                message: err.to_string(),
            }),
        },
        None => Ok(default),
    }
}

/// Run configuration for the load generator.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Base URL of the image builder API.
    pub base_url: String,
    /// Number of concurrent virtual users.
    pub users: u32,
    /// Measured test duration in seconds, excluding warmup.
    pub duration_secs: u64,
    /// Warmup seconds excluded from statistics.
    pub warmup_secs: u64,
    /// Optional cap on total requests per second across all users.
    pub requests_per_second: Option<f64>,
    /// Forward proxy applied to both HTTP and HTTPS traffic.
    pub proxy: Option<String>,
    /// Include tasks tagged as debug (the version probe).
    pub include_debug_tasks: bool,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl TestConfig {
    /// Validate configuration.
    pub fn validate(&self) -> LoadTestResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(LoadTestError::InvalidConfig(
                "base_url must not be empty".to_string(),
            ));
        }
        if self.users == 0 {
            return Err(LoadTestError::InvalidConfig("users must be > 0".to_string()));
        }
        if self.duration_secs == 0 {
            return Err(LoadTestError::InvalidConfig(
                "duration_secs must be > 0".to_string(),
            ));
        }
        if let Some(rps) = self.requests_per_second {
            if rps <= 0.0 {
                return Err(LoadTestError::InvalidConfig(
                    "requests_per_second must be > 0".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_config() -> TestConfig {
        TestConfig {
            base_url: "http://localhost:8086".to_string(),
            users: 10,
            duration_secs: 60,
            warmup_secs: 0,
            requests_per_second: None,
            proxy: None,
            include_debug_tasks: false,
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn test_defaults_when_env_unset() {
        let thresholds = Thresholds::from_lookup(|_| None).unwrap();
        assert_eq!(thresholds, Thresholds::default());
        assert_eq!(thresholds.compose_fail_ratio, 0.01);
        assert_eq!(thresholds.compose_p95_ms, 6000.0);
        assert_eq!(thresholds.fail_ratio, 0.01);
        assert_eq!(thresholds.mean_ms, 200.0);
        assert_eq!(thresholds.median_ms, 280.0);
        assert_eq!(thresholds.p95_ms, 500.0);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("COMPOSE_LT_FAIL_RATIO", "0.05"),
            ("LT_MEAN_RESPONSE_TIME", "1000"),
        ]
        .into_iter()
        .collect();

        let thresholds =
            Thresholds::from_lookup(|var| env.get(var).map(|v| v.to_string())).unwrap();
        assert_eq!(thresholds.compose_fail_ratio, 0.05);
        assert_eq!(thresholds.mean_ms, 1000.0);
        // Unset variables keep their defaults.
        assert_eq!(thresholds.median_ms, 280.0);
        assert_eq!(thresholds.compose_p95_ms, 6000.0);
    }

    #[test]
    fn test_malformed_threshold_is_an_error() {
        let result = Thresholds::from_lookup(|var| {
            (var == "LT_FAIL_RATIO").then(|| "not-a-number".to_string())
        });
        match result {
            Err(LoadTestError::InvalidThreshold { var, value, .. }) => {
                assert_eq!(var, "LT_FAIL_RATIO");
                assert_eq!(value, "not-a-number");
            }
            other => panic!("expected InvalidThreshold, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_sane_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_users() {
        let mut config = test_config();
        config.users = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let mut config = test_config();
        config.duration_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let mut config = test_config();
        config.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
