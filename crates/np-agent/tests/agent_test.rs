mod support;

use std::time::Duration;

use np_agent::agent::{AgentError, RunOutcome};
use support::{agent, FixedApi};

#[tokio::test(start_paused = true)]
async fn report_carries_metrics_and_identity() {
    let dir = tempfile::tempdir().unwrap();
    let mut agent = agent(dir.path(), FixedApi::answering("{}"), false);

    let report = agent.build_report().await.unwrap();

    assert_eq!(report.name, "vpn7");
    assert_eq!(report.secret, "s3cret");
    assert_eq!(report.snapshot.cpu, 5.0);
    assert_eq!(report.snapshot.uptime, "1d 1h");
    assert_eq!(report.snapshot.total_throughput, 3);
    assert_eq!(report.snapshot.throughput, 0);
    assert!(report.snapshot.selfcheck_ok);
    assert_eq!(report.snapshot.usercount, 1);
}

#[tokio::test(start_paused = true)]
async fn clean_response_is_delivered() {
    let dir = tempfile::tempdir().unwrap();
    let api = FixedApi::answering(r#"{"status": "ok"}"#);
    let mut agent = agent(dir.path(), api.clone(), true);

    let outcome = agent.run_once().await.unwrap();

    match outcome {
        RunOutcome::Delivered(response) => assert_eq!(response.body()["status"], "ok"),
        other => panic!("expected delivery, got {other:?}"),
    }
    let forms = api.forms.lock().unwrap();
    assert!(forms[0].contains(&("name", "vpn7".to_string())));
    assert!(forms[0].contains(&("secret", "s3cret".to_string())));
}

#[tokio::test(start_paused = true)]
async fn api_error_completes_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let api = FixedApi::answering(r#"{"error": "node disabled"}"#);
    let mut agent = agent(dir.path(), api.clone(), false);

    let outcome = agent.run_once().await.unwrap();

    match outcome {
        RunOutcome::ApiError { error, .. } => assert_eq!(error, "node disabled"),
        other => panic!("expected an API error, got {other:?}"),
    }
    assert_eq!(api.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_api_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let api = FixedApi::unreachable();
    let mut agent = agent(dir.path(), api.clone(), false);
    let started = tokio::time::Instant::now();

    let err = agent.run_once().await.unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(api.calls(), 3);
    // 4.5s of sampling plus two 30s backoffs.
    assert_eq!(started.elapsed(), Duration::from_millis(64_500));
}

#[tokio::test(start_paused = true)]
async fn metrics_failure_stops_before_sending() {
    let dir = tempfile::tempdir().unwrap();
    let api = FixedApi::answering("{}");
    let mut agent = agent(dir.path(), api.clone(), false);
    std::fs::remove_file(dir.path().join("uptime")).unwrap();

    let err = agent.run_once().await.unwrap_err();

    assert!(matches!(err, AgentError::Metrics(_)));
    assert!(!err.is_fatal());
    assert_eq!(api.calls(), 0);
}
