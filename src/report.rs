//! Results reporting and formatting.

use crate::config::TestConfig;
use crate::stats::StatsTable;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde::Serialize;
use std::time::Duration;

/// Per-endpoint row of the final report.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointReport {
    pub method: String,
    pub name: String,
    pub requests: u64,
    pub failures: u64,
    pub fail_ratio: f64,
    pub avg_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
    pub requests_per_second: f64,
}

/// Full results of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResults {
    pub timestamp: String,
    pub base_url: String,
    pub users: u32,
    pub duration_secs: f64,
    pub endpoints: Vec<EndpointReport>,
}

impl RunResults {
    /// Build results from the finalized table and run configuration.
    pub fn new(config: &TestConfig, table: &StatsTable, elapsed: Duration) -> Self {
        let duration_secs = elapsed.as_secs_f64();
        let endpoints = table
            .iter()
            .map(|(key, stats)| EndpointReport {
                method: key.method.to_string(),
                name: key.name.to_string(),
                requests: stats.requests(),
                failures: stats.failures(),
                fail_ratio: stats.fail_ratio(),
                avg_ms: stats.avg_ms(),
                median_ms: stats.median_ms(),
                p95_ms: stats.p95_ms(),
                max_ms: stats.max_ms(),
                requests_per_second: if duration_secs > 0.0 {
                    stats.requests() as f64 / duration_secs
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            base_url: config.base_url.clone(),
            users: config.users,
            duration_secs,
            endpoints,
        }
    }
}

/// Formats run results for output.
pub struct ResultsReport;

impl ResultsReport {
    /// Format results as a console table.
    pub fn format_table(results: &RunResults) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                "Endpoint", "Requests", "Failures", "Fail %", "Avg (ms)", "p50 (ms)", "p95 (ms)",
                "Max (ms)", "Req/s",
            ]);

        for endpoint in &results.endpoints {
            table.add_row(vec![
                format!("{} {}", endpoint.method, endpoint.name),
                format!("{}", endpoint.requests),
                format!("{}", endpoint.failures),
                format!("{:.2}", endpoint.fail_ratio * 100.0),
                format!("{:.1}", endpoint.avg_ms),
                format!("{:.1}", endpoint.median_ms),
                format!("{:.1}", endpoint.p95_ms),
                format!("{:.1}", endpoint.max_ms),
                format!("{:.1}", endpoint.requests_per_second),
            ]);
        }

        table.to_string()
    }

    /// Format results as JSON.
    pub fn format_json(results: &RunResults) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(results)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::EndpointStats;
    use crate::workload::DISTRIBUTIONS;

    fn sample_results() -> RunResults {
        let mut stats = EndpointStats::new();
        for _ in 0..10 {
            stats.record(Duration::from_millis(50), true);
        }
        stats.record(Duration::from_millis(50), false);

        let table: StatsTable = [(DISTRIBUTIONS, stats)].into_iter().collect();
        let config = TestConfig {
            base_url: "http://localhost:8086".to_string(),
            users: 4,
            duration_secs: 10,
            warmup_secs: 0,
            requests_per_second: None,
            proxy: None,
            include_debug_tasks: false,
            request_timeout_secs: 30,
        };
        RunResults::new(&config, &table, Duration::from_secs(10))
    }

    #[test]
    fn test_table_lists_every_endpoint() {
        let rendered = ResultsReport::format_table(&sample_results());
        assert!(rendered.contains("GET /distributions"));
        assert!(rendered.contains("11"));
    }

    #[test]
    fn test_json_round_trips() {
        let results = sample_results();
        let json = ResultsReport::format_json(&results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["base_url"], "http://localhost:8086");
        assert_eq!(value["endpoints"].as_array().unwrap().len(), 1);
        assert_eq!(value["endpoints"][0]["name"], "/distributions");
        assert_eq!(value["endpoints"][0]["requests"], 11);
        assert_eq!(value["endpoints"][0]["failures"], 1);
    }
}
