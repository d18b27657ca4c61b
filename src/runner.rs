//! Virtual-user scheduling and load test orchestration.

use crate::client::{ApiClient, Sample};
use crate::config::TestConfig;
use crate::error::LoadTestResult;
use crate::stats::{StatsRegistry, StatsTable};
use crate::workload::{self, Task};
use indicatif::{ProgressBar, ProgressStyle};
use rand::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

/// Outcome of one bounded run: the finalized statistics table and the
/// measured wall-clock duration (warmup excluded).
pub struct RunOutcome {
    pub table: StatsTable,
    pub elapsed: Duration,
}

/// Executes the workload with controlled concurrency.
pub struct LoadRunner {
    config: TestConfig,
    client: ApiClient,
}

impl LoadRunner {
    /// Create a runner. Builds the HTTP client shared by all virtual users.
    pub fn new(config: TestConfig) -> LoadTestResult<Self> {
        let client = ApiClient::new(&config)?;
        Ok(Self { config, client })
    }

    /// Run the workload for the configured warmup plus duration, then return
    /// the finalized statistics. All virtual users are joined before the
    /// snapshot is taken, so the table has no concurrent writers.
    pub async fn run(&self) -> anyhow::Result<RunOutcome> {
        let mix = Task::mix(self.config.include_debug_tasks);
        anyhow::ensure!(!mix.is_empty(), "task mix is empty");

        info!(
            users = self.config.users,
            duration_secs = self.config.duration_secs,
            warmup_secs = self.config.warmup_secs,
            "starting load test"
        );

        let stats = Arc::new(StatsRegistry::new());
        let start = Instant::now();
        let warmup_end = start + Duration::from_secs(self.config.warmup_secs);
        let deadline = warmup_end + Duration::from_secs(self.config.duration_secs);

        // Per-user pacing interval derived from the global rate cap.
        let pace = self
            .config
            .requests_per_second
            .map(|rps| Duration::from_secs_f64(f64::from(self.config.users) / rps));

        let total_secs = self.config.duration_secs + self.config.warmup_secs;
        let pb = ProgressBar::new(total_secs);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len}s {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("##-"),
        );
        if self.config.warmup_secs > 0 {
            pb.set_message("warmup");
        }

        let mut users = Vec::with_capacity(self.config.users as usize);
        for _ in 0..self.config.users {
            let client = self.client.clone();
            let stats = stats.clone();
            let mix = mix.clone();
            users.push(tokio::spawn(async move {
                user_loop(client, stats, mix, deadline, pace).await;
            }));
        }

        let mut warmup_complete = self.config.warmup_secs == 0;
        while Instant::now() < deadline {
            if !warmup_complete && Instant::now() >= warmup_end {
                warmup_complete = true;
                pb.set_message("");
                // Discard everything observed during warmup.
                stats.reset().await;
            }
            pb.set_position(start.elapsed().as_secs().min(total_secs));
            sleep(Duration::from_millis(250)).await;
        }

        pb.set_message("waiting for in-flight requests");
        for user in users {
            user.await?;
        }
        pb.finish_with_message("Complete!");

        Ok(RunOutcome {
            table: stats.snapshot().await,
            elapsed: start
                .elapsed()
                .saturating_sub(Duration::from_secs(self.config.warmup_secs)),
        })
    }
}

async fn user_loop(
    client: ApiClient,
    stats: Arc<StatsRegistry>,
    mix: Vec<Task>,
    deadline: Instant,
    pace: Option<Duration>,
) {
    let mut rng = StdRng::from_entropy();
    let total_weight: f64 = mix.iter().map(|task| task.weight()).sum();
    let mut last_request_time = Instant::now();

    while Instant::now() < deadline {
        if let Some(interval) = pace {
            let since_last = last_request_time.elapsed();
            if since_last < interval {
                sleep(interval - since_last).await;
            }
            last_request_time = Instant::now();
        }

        let task = pick_task(&mix, total_weight, &mut rng);
        execute_task(task, &client, &stats).await;
    }
}

/// Execute one task iteration, recording every resulting sample.
///
/// The distribution task issues one follow-up architectures request per
/// record returned, in response order.
pub async fn execute_task(task: Task, client: &ApiClient, stats: &StatsRegistry) {
    match task {
        Task::Compose => {
            let request = workload::compose_request();
            record(stats, client.compose(&request).await).await;
        }
        Task::Packages => record(stats, client.search_packages().await).await,
        Task::Version => record(stats, client.version().await).await,
        Task::Distributions => {
            let (sample, distributions) = client.distributions().await;
            record(stats, sample).await;
            if let Some(distributions) = distributions {
                for distribution in &distributions {
                    record(stats, client.architectures(&distribution.name).await).await;
                }
            }
        }
    }
}

async fn record(stats: &StatsRegistry, sample: Sample) {
    if let Some(error) = &sample.error {
        warn!(endpoint = %sample.key, error = %error, "request failed");
    } else if !sample.success {
        warn!(endpoint = %sample.key, status = sample.status, "request returned error status");
    }
    stats.record(sample.key, sample.latency, sample.success).await;
}

fn pick_task(mix: &[Task], total_weight: f64, rng: &mut StdRng) -> Task {
    let mut roll = rng.gen::<f64>() * total_weight;
    for task in mix {
        roll -= task.weight();
        if roll <= 0.0 {
            return *task;
        }
    }
    mix[mix.len() - 1]
}
