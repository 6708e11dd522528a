mod harness;

use std::sync::Arc;
use std::time::Duration;

use cadence::adapter::outbound::upstream::UpstreamSubscriber;
use cadence::domain::{Mode, RunSource, Timeframe};
use cadence::infrastructure::runtime::Application;
use cadence::infrastructure::status_file::{StatusFile, StatusWriter};
use cadence::testkit::fixture::H4;
use harness::eventually;
use harness::stack::StackBuilder;
use harness::upstream::UpstreamPeer;
use serde_json::json;
use tokio::sync::watch;

#[tokio::test]
async fn live_boundary_then_paper_replay_then_back_to_live() {
    let dir = tempfile::tempdir().unwrap();
    let status_path = dir.path().join("status.json");
    let stack = StackBuilder::new(H4 * 5 + 1_000).build(&dir.path().join("state"));
    let orchestrator = Arc::clone(&stack.orchestrator);

    let peer = UpstreamPeer::bind().await;
    let (subscriber, events) = UpstreamSubscriber::new(peer.endpoint(), Duration::from_millis(50));
    let app = Application::new(Arc::clone(&orchestrator), stack.triggers)
        .with_upstream(Some(Arc::new(subscriber)), events)
        .with_status(
            StatusWriter::new(status_path.clone(), vec![Timeframe::H4]),
            Duration::from_secs(60),
        );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(app.run(shutdown_rx));

    eventually("live commit", || {
        orchestrator.last_run(Timeframe::H4, RunSource::Live) == Some(H4 * 5)
    })
    .await;

    let mut session = peer.accept().await;
    session.send(json!({ "type": "paper_on" })).await;
    session
        .send(json!({
            "type": "candles",
            "timeframe": "4h",
            "timestamp": H4 * 7,
            "candles": [
                { "time": H4 * 6, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5 },
                { "time": H4 * 7, "open": 1.5, "high": 2.5, "low": 1.0, "close": 2.0 },
            ],
        }))
        .await;

    eventually("paper commit", || {
        orchestrator.last_run(Timeframe::H4, RunSource::Paper) == Some(H4 * 7)
    })
    .await;
    assert_eq!(orchestrator.mode(), Mode::Paper);
    assert_eq!(
        orchestrator.last_run(Timeframe::H4, RunSource::Live),
        Some(H4 * 5)
    );

    session.send(json!({ "type": "paper_off" })).await;
    eventually("live mode", || orchestrator.mode() == Mode::Live).await;

    shutdown_tx.send(true).unwrap();
    running.await.unwrap().unwrap();

    assert!(!orchestrator.scheduler().is_running());
    let status = StatusFile::read(&status_path).unwrap();
    assert_eq!(status.mode, Mode::Live);
    assert_eq!(status.last_run.get(&Timeframe::H4), Some(&(H4 * 5)));
    assert_eq!(status.runs.committed, 2);
}

#[tokio::test]
async fn dropping_the_shutdown_sender_stops_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let stack = StackBuilder::new(H4 * 5 + 1_000).build(dir.path());
    let orchestrator = Arc::clone(&stack.orchestrator);
    let app = Application::new(Arc::clone(&orchestrator), stack.triggers);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(app.run(shutdown_rx));
    eventually("scheduler running", || orchestrator.scheduler().is_running()).await;

    drop(shutdown_tx);
    tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(!orchestrator.scheduler().is_running());
}
