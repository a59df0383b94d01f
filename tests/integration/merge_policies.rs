//! Priority and absorption rules across the fold chain.

use std::time::Duration;

use rxfan::error::WorkflowError;
use tokio_test::assert_ok;

use crate::fixtures::{fail_after, succeed_after, FanOutHarness};

const QUICK: Duration = Duration::from_millis(10);
const STEADY: Duration = Duration::from_millis(40);

fn backend_err(workflow: &str, reason: &str) -> WorkflowError {
    WorkflowError::Backend {
        workflow: workflow.to_string(),
        reason: reason.to_string(),
    }
}

/// Test: failure dominance
/// Given a failing preferred workflow
/// When every supplemental workflow succeeds
/// Then the request fails with the preferred failure
#[tokio::test]
async fn test_preferred_failure_dominates_supplemental_successes() {
    let harness = FanOutHarness::new(
        fail_after("pbm_workflow", "rejected", QUICK),
        succeed_after("g", QUICK),
        succeed_after("rx", QUICK),
        succeed_after("gaps", QUICK),
    );

    let result = harness.orchestrator.handle("rtpbi_request::x").await;
    assert_eq!(result, Err(backend_err("pbm_workflow", "rejected")));
}

/// Test: both-fail pinning
/// Given preferred and good_rx both failing
/// When the request is handled
/// Then the preferred error is the one that surfaces
#[tokio::test]
async fn test_both_fail_surfaces_preferred_error() {
    let harness = FanOutHarness::new(
        fail_after("pbm_workflow", "rejected", QUICK),
        fail_after("guide_workflow", "unreachable", QUICK),
        fail_after("good_rx_workflow", "timeout", QUICK),
        fail_after("gaps_in_care_workflow", "timeout", QUICK),
    );

    let result = harness.orchestrator.handle("rtpbi_request::x").await;
    assert_eq!(result, Err(backend_err("pbm_workflow", "rejected")));
}

/// Test: join order
/// Given preferred and guide both succeeding
/// Then the combined value joins preferred before guide
#[tokio::test]
async fn test_join_order_is_preferred_then_guide() {
    let harness = FanOutHarness::new(
        succeed_after("p", STEADY),
        succeed_after("g", STEADY),
        fail_after("good_rx_workflow", "timeout", QUICK),
        fail_after("gaps_in_care_workflow", "timeout", QUICK),
    );

    let response = assert_ok!(harness.orchestrator.handle("rtpbi_request::x").await);
    assert_eq!(response, "p, g");
}

/// Test: guide failure absorption
/// Given a failing guide workflow
/// When the preferred workflow succeeds
/// Then the combined value equals the preferred value unchanged
#[tokio::test]
async fn test_guide_failure_leaves_preferred_unchanged() {
    let harness = FanOutHarness::new(
        succeed_after("p", STEADY),
        fail_after("guide_workflow", "unreachable", QUICK),
        fail_after("good_rx_workflow", "timeout", QUICK),
        fail_after("gaps_in_care_workflow", "timeout", QUICK),
    );

    let response = assert_ok!(harness.orchestrator.handle("rtpbi_request::x").await);
    assert_eq!(response, "p");
}

/// Test: good_rx contributes independently of guide
/// Given a failing guide but a settled good_rx
/// Then good_rx's value is still joined onto the preferred value
#[tokio::test]
async fn test_good_rx_joins_when_guide_fails() {
    let harness = FanOutHarness::new(
        succeed_after("p", STEADY),
        fail_after("guide_workflow", "unreachable", QUICK),
        succeed_after("rx", QUICK),
        fail_after("gaps_in_care_workflow", "timeout", QUICK),
    );

    let response = assert_ok!(harness.orchestrator.handle("rtpbi_request::x").await);
    assert_eq!(response, "p, rx");
}

/// Test: supplemental failures never emit a request failure
/// Given failing supplemental workflows only
/// Then the request succeeds and no manager-level failure is recorded
#[tokio::test]
async fn test_supplemental_failures_are_not_request_failures() {
    let harness = FanOutHarness::new(
        succeed_after("p", STEADY),
        fail_after("guide_workflow", "unreachable", QUICK),
        fail_after("good_rx_workflow", "timeout", QUICK),
        fail_after("gaps_in_care_workflow", "timeout", QUICK),
    );

    let response = assert_ok!(harness.orchestrator.handle("rtpbi_request::x").await);
    assert_eq!(response, "p");
    assert!(!harness.sink.contains("manage_pbm_requests::request_failed"));
}
