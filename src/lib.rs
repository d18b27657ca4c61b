//! Load testing framework for the image builder service.
//!
//! This crate provides tools to:
//! - Drive a weighted mix of image builder API requests
//! - Execute load tests with controlled concurrency
//! - Collect per-endpoint latency and failure statistics
//! - Gate CI pipelines on configurable latency and error-rate thresholds

pub mod client;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod report;
pub mod runner;
pub mod stats;
pub mod workload;

pub use client::{ApiClient, Sample};
pub use config::{TestConfig, Thresholds};
pub use error::{LoadTestError, LoadTestResult};
pub use evaluator::{evaluate, Evaluation, Finding, Verdict, Violation, SUCCESS_MESSAGE};
pub use report::{EndpointReport, ResultsReport, RunResults};
pub use runner::{execute_task, LoadRunner, RunOutcome};
pub use stats::{EndpointKey, EndpointStats, StatsRegistry, StatsTable};
pub use workload::{Distribution, Task};
