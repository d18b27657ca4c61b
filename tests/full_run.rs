//! End-to-end smoke runs against a local stub service.

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use image_builder_load_test::{
    evaluate, workload, LoadRunner, TestConfig, Thresholds, Verdict,
};
use serde_json::json;
use std::net::SocketAddr;

async fn spawn_app(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_healthy_stub() -> SocketAddr {
    let app = Router::new()
        .route(
            "/distributions",
            get(|| async { r#"[{"name":"centos-9"},{"name":"rhel-9"}]"# }),
        )
        .route(
            "/architectures/:distribution",
            get(|| async { Json(json!([{"arch": "x86_64"}])) }),
        )
        .route(
            "/compose",
            post(|| async { Json(json!({"id": "c0ffee00-0000-4000-8000-000000000000"})) }),
        )
        .route("/packages", get(|| async { Json(json!({"data": []})) }))
        .route("/version", get(|| async { Json(json!({"version": "1.0"})) }));
    spawn_app(app).await
}

async fn spawn_failing_stub() -> SocketAddr {
    let app = Router::new()
        .route("/distributions", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/compose", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/packages", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/version", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    spawn_app(app).await
}

fn config(addr: SocketAddr, duration_secs: u64, warmup_secs: u64) -> TestConfig {
    TestConfig {
        base_url: format!("http://{addr}"),
        users: 4,
        duration_secs,
        warmup_secs,
        requests_per_second: None,
        proxy: None,
        include_debug_tasks: false,
        request_timeout_secs: 5,
    }
}

#[tokio::test]
async fn healthy_run_collects_stats_and_passes_generous_thresholds() {
    let addr = spawn_healthy_stub().await;
    let runner = LoadRunner::new(config(addr, 2, 0)).unwrap();

    let outcome = runner.run().await.unwrap();

    assert!(!outcome.table.is_empty());
    let total: u64 = outcome.table.values().map(|stats| stats.requests()).sum();
    assert!(total > 0);
    // Debug tasks were excluded, so no version bucket exists.
    assert!(!outcome.table.contains_key(&workload::VERSION));

    let thresholds = Thresholds::from_lookup(|_| Some("1000000".to_string())).unwrap();
    let evaluation = evaluate(&outcome.table, &thresholds);
    assert_eq!(evaluation.verdict(), Verdict::Pass);
    assert_eq!(evaluation.exit_code(), 0);
    assert!(evaluation.findings.is_empty());
}

#[tokio::test]
async fn warmup_run_completes_and_still_collects_stats() {
    let addr = spawn_healthy_stub().await;
    let runner = LoadRunner::new(config(addr, 1, 1)).unwrap();

    let outcome = runner.run().await.unwrap();

    let total: u64 = outcome.table.values().map(|stats| stats.requests()).sum();
    assert!(total > 0);
}

#[tokio::test]
async fn failing_service_fails_the_gate_with_default_thresholds() {
    let addr = spawn_failing_stub().await;
    let runner = LoadRunner::new(config(addr, 1, 0)).unwrap();

    let outcome = runner.run().await.unwrap();

    let evaluation = evaluate(&outcome.table, &Thresholds::default());
    assert_eq!(evaluation.verdict(), Verdict::Fail);
    assert_eq!(evaluation.exit_code(), 1);
    assert!(!evaluation.findings.is_empty());
    // Every bucketed endpoint violated its failure-ratio threshold first.
    for finding in &evaluation.findings {
        assert!(matches!(
            finding.violation,
            image_builder_load_test::Violation::FailRatio { .. }
        ));
    }
}
