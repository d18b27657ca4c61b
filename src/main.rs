//! Load test CLI for the image builder service.

use clap::Parser;
use image_builder_load_test::{
    evaluate, LoadRunner, ResultsReport, RunResults, TestConfig, Thresholds, Verdict,
    SUCCESS_MESSAGE,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "image-builder-load-test")]
#[command(about = "Load testing tool for the image builder service", long_about = None)]
struct Args {
    /// Base URL of the image builder API
    #[arg(short, long, env = "LOAD_TEST_BASE_URL")]
    base_url: String,

    /// Number of concurrent virtual users
    #[arg(short, long, default_value = "10")]
    users: u32,

    /// Test duration in seconds, excluding warmup
    #[arg(short, long, default_value = "60")]
    duration: u64,

    /// Warmup seconds excluded from statistics
    #[arg(long, default_value = "0")]
    warmup: u64,

    /// Optional cap on total requests per second across all users
    #[arg(long)]
    requests_per_second: Option<f64>,

    /// Forward proxy applied to both HTTP and HTTPS traffic
    #[arg(long, env = "LOAD_TEST_PROXY")]
    proxy: Option<String>,

    /// Include tasks tagged debug (the version probe)
    #[arg(long)]
    include_debug_tasks: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Output format: table (default), json
    #[arg(short, long, default_value = "table")]
    output: String,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Thresholds are read once at startup and immutable afterwards.
    let thresholds = Thresholds::from_env()?;

    let config = TestConfig {
        base_url: args.base_url,
        users: args.users,
        duration_secs: args.duration,
        warmup_secs: args.warmup,
        requests_per_second: args.requests_per_second,
        proxy: args.proxy,
        include_debug_tasks: args.include_debug_tasks,
        request_timeout_secs: args.timeout,
    };
    config.validate()?;

    println!("✓ Configuration loaded");
    println!("  Base URL: {}", config.base_url);
    println!("  Users: {}", config.users);
    println!("  Duration: {}s", config.duration_secs);
    if config.warmup_secs > 0 {
        println!("  Warmup: {}s", config.warmup_secs);
    }
    if let Some(rps) = config.requests_per_second {
        println!("  Rate limit: {rps:.1} req/s");
    }
    if let Some(proxy) = &config.proxy {
        println!("  Proxy: {proxy}");
    }
    println!();

    let runner = LoadRunner::new(config.clone())?;
    let outcome = runner.run().await?;

    let results = RunResults::new(&config, &outcome.table, outcome.elapsed);
    match args.output.as_str() {
        "json" => println!("{}", ResultsReport::format_json(&results)?),
        _ => println!("{}", ResultsReport::format_table(&results)),
    }

    let evaluation = evaluate(&outcome.table, &thresholds);
    for finding in &evaluation.findings {
        println!("{finding}");
    }
    if evaluation.verdict() == Verdict::Pass {
        println!("{SUCCESS_MESSAGE}");
    }

    std::process::exit(evaluation.exit_code());
}
