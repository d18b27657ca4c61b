//! End-of-run threshold evaluation.
//!
//! A pure, single-pass fold over the finalized statistics table: each
//! endpoint contributes at most one finding (the first threshold it violates,
//! in check order), and any finding makes the verdict [`Verdict::Fail`].

use crate::config::Thresholds;
use crate::stats::{EndpointKey, EndpointStats, StatsTable};
use crate::workload;
use std::fmt;

/// Printed when every endpoint stayed within its thresholds.
pub const SUCCESS_MESSAGE: &str = "Composer is fast enough 🚀";

/// A single threshold breach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Violation {
    /// Failure ratio above the configured maximum fraction.
    FailRatio { limit: f64 },
    /// Mean latency above the configured maximum.
    MeanResponseTime { limit_ms: f64 },
    /// Median latency above the configured maximum.
    MedianResponseTime { limit_ms: f64 },
    /// 95th percentile latency above the configured maximum.
    Percentile95 { limit_ms: f64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::FailRatio { limit } => write!(f, "failure ratio > {limit}"),
            Violation::MeanResponseTime { limit_ms } => {
                write!(f, "average response time > {limit_ms} ms")
            }
            Violation::MedianResponseTime { limit_ms } => {
                write!(f, "median response time > {limit_ms} ms")
            }
            Violation::Percentile95 { limit_ms } => {
                write!(f, "95th percentile response time > {limit_ms} ms")
            }
        }
    }
}

/// One endpoint's first violated threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Finding {
    /// Endpoint that breached a threshold.
    pub key: EndpointKey,
    /// The first violated threshold in check order.
    pub violation: Violation,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed due to {}", self.key, self.violation)
    }
}

/// Overall pass/fail decision for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// Result of evaluating the statistics table against the thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// One finding per violating endpoint, in table key order.
    pub findings: Vec<Finding>,
}

impl Evaluation {
    /// The overall verdict: [`Verdict::Fail`] once any endpoint violates its
    /// profile, never reset back to pass.
    pub fn verdict(&self) -> Verdict {
        if self.findings.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    /// The process exit code derived from the verdict.
    pub fn exit_code(&self) -> i32 {
        match self.verdict() {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
        }
    }
}

/// Check one endpoint against its threshold profile.
///
/// The compose endpoint is checked against the compose profile (failure
/// ratio, then p95); every other endpoint against the default profile
/// (failure ratio, then mean, then median, then p95). Checks short-circuit:
/// only the first unmet condition is reported for an endpoint.
pub fn check_endpoint(
    key: &EndpointKey,
    stats: &EndpointStats,
    thresholds: &Thresholds,
) -> Option<Violation> {
    if *key == workload::COMPOSE {
        if stats.fail_ratio() > thresholds.compose_fail_ratio {
            Some(Violation::FailRatio {
                limit: thresholds.compose_fail_ratio,
            })
        } else if stats.p95_ms() > thresholds.compose_p95_ms {
            Some(Violation::Percentile95 {
                limit_ms: thresholds.compose_p95_ms,
            })
        } else {
            None
        }
    } else if stats.fail_ratio() > thresholds.fail_ratio {
        Some(Violation::FailRatio {
            limit: thresholds.fail_ratio,
        })
    } else if stats.avg_ms() > thresholds.mean_ms {
        Some(Violation::MeanResponseTime {
            limit_ms: thresholds.mean_ms,
        })
    } else if stats.median_ms() > thresholds.median_ms {
        Some(Violation::MedianResponseTime {
            limit_ms: thresholds.median_ms,
        })
    } else if stats.p95_ms() > thresholds.p95_ms {
        Some(Violation::Percentile95 {
            limit_ms: thresholds.p95_ms,
        })
    } else {
        None
    }
}

/// Evaluate the finalized statistics table against the thresholds.
pub fn evaluate(table: &StatsTable, thresholds: &Thresholds) -> Evaluation {
    let findings = table
        .iter()
        .filter_map(|(key, stats)| {
            check_endpoint(key, stats, thresholds).map(|violation| Finding {
                key: *key,
                violation,
            })
        })
        .collect();
    Evaluation { findings }
}
