//! Snapshot-then-abandon behavior of the slow supplemental path.
//!
//! The gaps_in_care fold waits for the higher-priority chain to settle,
//! then takes a non-blocking snapshot of the slow task. These tests verify
//! both sides of that snapshot, and that abandonment never waits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_test::assert_ok;

use crate::fixtures::{fail_after, succeed_after, tracked, FanOutHarness};

const QUICK: Duration = Duration::from_millis(10);
const STEADY: Duration = Duration::from_millis(60);
const GLACIAL: Duration = Duration::from_millis(600);

/// Test: abandonment
/// Given a gaps_in_care workflow slower than the rest of the chain
/// When the request is handled
/// Then its value is absent and the abandonment event is emitted
#[tokio::test]
async fn test_slow_path_is_abandoned() {
    let harness = FanOutHarness::new(
        succeed_after("p", QUICK),
        succeed_after("g", QUICK),
        succeed_after("rx", QUICK),
        succeed_after("gaps", GLACIAL),
    );

    let response = assert_ok!(harness.orchestrator.handle("rtpbi_request::x").await);
    assert_eq!(response, "p, g, rx");
    assert!(harness
        .sink
        .contains("gaps_in_care_workflow::request_abandoned"));
}

/// Test: abandonment never waits
/// Given a glacial gaps_in_care workflow
/// When the rest of the chain settles
/// Then the orchestrator returns well before the slow task would have
#[tokio::test]
async fn test_orchestrator_returns_before_slow_task_settles() {
    let harness = FanOutHarness::new(
        succeed_after("p", QUICK),
        succeed_after("g", QUICK),
        succeed_after("rx", QUICK),
        succeed_after("gaps", GLACIAL),
    );

    let started = Instant::now();
    let response = assert_ok!(harness.orchestrator.handle("rtpbi_request::x").await);
    let elapsed = started.elapsed();

    assert_eq!(response, "p, g, rx");
    assert!(
        elapsed < GLACIAL / 2,
        "handle took {:?}, which means it waited on the abandoned task",
        elapsed
    );
}

/// Test: settled slow path contributes
/// Given a gaps_in_care workflow faster than the preferred chain
/// When the request is handled
/// Then its value is folded in and no abandonment is recorded
#[tokio::test]
async fn test_settled_slow_path_is_folded_in() {
    let harness = FanOutHarness::new(
        succeed_after("p", STEADY),
        succeed_after("g", STEADY),
        succeed_after("rx", QUICK),
        succeed_after("gaps", QUICK),
    );

    let response = assert_ok!(harness.orchestrator.handle("rtpbi_request::x").await);
    assert_eq!(response, "p, g, rx, gaps");
    assert!(!harness
        .sink
        .contains("gaps_in_care_workflow::request_abandoned"));
}

/// Test: settled slow-path failure is absorbed
/// Given a gaps_in_care workflow that fails before the chain settles
/// Then the response is unchanged and the request still succeeds
#[tokio::test]
async fn test_settled_slow_path_failure_is_absorbed() {
    let harness = FanOutHarness::new(
        succeed_after("p", STEADY),
        succeed_after("g", STEADY),
        succeed_after("rx", QUICK),
        fail_after("gaps_in_care_workflow", "screening error", QUICK),
    );

    let response = assert_ok!(harness.orchestrator.handle("rtpbi_request::x").await);
    assert_eq!(response, "p, g, rx");
    assert!(!harness.sink.contains("manage_pbm_requests::request_failed"));
}

/// Test: abandoned units run to completion
/// Given an abandoned gaps_in_care workflow
/// When enough time passes after the response is returned
/// Then the abandoned unit has still finished on its own; its result is
/// simply never consumed
#[tokio::test(flavor = "multi_thread")]
async fn test_abandoned_unit_runs_to_completion() {
    let finished = Arc::new(AtomicBool::new(false));
    let harness = FanOutHarness::new(
        succeed_after("p", QUICK),
        succeed_after("g", QUICK),
        succeed_after("rx", QUICK),
        tracked("gaps", Duration::from_millis(100), Arc::clone(&finished)),
    );

    let response = assert_ok!(harness.orchestrator.handle("rtpbi_request::x").await);
    assert_eq!(response, "p, g, rx");
    assert!(
        !finished.load(Ordering::Acquire),
        "the slow unit should still be running when the response returns"
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(finished.load(Ordering::Acquire));
}

/// Test: abandoned failures stay silent
/// Given an abandoned gaps_in_care workflow that eventually fails
/// Then the failure is never surfaced or recorded as a request failure
#[tokio::test(flavor = "multi_thread")]
async fn test_abandoned_failure_never_surfaces() {
    let harness = FanOutHarness::new(
        succeed_after("p", QUICK),
        succeed_after("g", QUICK),
        succeed_after("rx", QUICK),
        fail_after("gaps_in_care_workflow", "late failure", Duration::from_millis(100)),
    );

    let response = assert_ok!(harness.orchestrator.handle("rtpbi_request::x").await);
    assert_eq!(response, "p, g, rx");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!harness.sink.contains("manage_pbm_requests::request_failed"));
}
