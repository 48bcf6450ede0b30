//! Tests for src/facade.rs
//! Callers of `Delegator::delegate_to_agent` must get the same contract no
//! matter which path serves them; the fallback collaborator is stubbed so no
//! real subprocess runs.

mod common;

use common::{FailingDelegate, ScriptedInvoker, SlowInvoker, StubDelegate};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use switchboard::{AgentType, Delegator, OrchestrationError, OrchestrationMode};
use tempfile::TempDir;

#[tokio::test(start_paused = true)]
async fn local_failure_falls_back_transparently() {
    let dir = TempDir::new().unwrap();
    let fallback = Arc::new(StubDelegate::new());
    let delegator = Delegator::new(
        dir.path(),
        Arc::new(SlowInvoker {
            delay: Duration::from_secs(60),
        }),
        fallback.clone(),
    )
    .with_mode(OrchestrationMode::Local)
    .with_delegation_timeout(Duration::from_millis(100));

    let result = delegator
        .delegate_to_agent(&AgentType::Engineer, "implement feature")
        .await
        .expect("fallback result, not an error");

    assert!(result.is_completed());
    assert_eq!(result.data["result"], "fallback handled: implement feature");
    assert_eq!(fallback.call_count(), 1);

    let metrics = delegator.metrics();
    assert_eq!(metrics.total_delegations, 1);
    assert_eq!(metrics.fallback_delegations, 1);
    assert_eq!(metrics.local_delegations, 0);
}

#[tokio::test]
async fn subprocess_mode_never_touches_the_local_path() {
    let dir = TempDir::new().unwrap();
    let invoker = Arc::new(ScriptedInvoker::single("should not run"));
    let fallback = Arc::new(StubDelegate::new());
    let delegator = Delegator::new(dir.path(), invoker.clone(), fallback.clone())
        .with_mode(OrchestrationMode::Subprocess);

    let result = delegator
        .delegate_to_agent(&AgentType::Qa, "run suite")
        .await
        .unwrap();

    assert!(result.is_completed());
    assert_eq!(invoker.call_count(), 0);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test]
async fn local_mode_serves_without_calling_the_fallback() {
    let dir = TempDir::new().unwrap();
    let fallback = Arc::new(StubDelegate::new());
    let delegator = Delegator::new(
        dir.path(),
        Arc::new(ScriptedInvoker::single("all tests pass")),
        fallback.clone(),
    )
    .with_mode(OrchestrationMode::Local);

    let result = delegator
        .delegate_to_agent(&AgentType::Qa, "run suite")
        .await
        .unwrap();

    assert!(result.is_completed());
    assert_eq!(result.data["result"], "all tests pass");
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test]
async fn fallback_failure_propagates_to_the_caller() {
    let dir = TempDir::new().unwrap();
    let delegator = Delegator::new(
        dir.path(),
        Arc::new(ScriptedInvoker::single("unused")),
        Arc::new(FailingDelegate),
    )
    .with_mode(OrchestrationMode::Subprocess);

    let err = delegator
        .delegate_to_agent(&AgentType::Ops, "deploy")
        .await
        .expect_err("nothing left to fall back to");
    assert!(matches!(err, OrchestrationError::Subprocess(_)));
}

#[tokio::test]
async fn mode_is_detected_from_the_project_configuration() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("CLAUDE.md"),
        "CLAUDE_PM_ORCHESTRATION: ENABLED\n",
    )
    .unwrap();

    let delegator = Delegator::new(
        dir.path(),
        Arc::new(ScriptedInvoker::single("ok")),
        Arc::new(StubDelegate::new()),
    );
    assert_eq!(delegator.mode().await, OrchestrationMode::Local);

    let bare = TempDir::new().unwrap();
    let delegator = Delegator::new(
        bare.path(),
        Arc::new(ScriptedInvoker::single("ok")),
        Arc::new(StubDelegate::new()),
    );
    assert_eq!(delegator.mode().await, OrchestrationMode::Subprocess);
}

#[tokio::test]
async fn mode_is_resolved_once_per_facade() {
    let dir = TempDir::new().unwrap();
    let delegator = Delegator::new(
        dir.path(),
        Arc::new(ScriptedInvoker::single("ok")),
        Arc::new(StubDelegate::new()),
    );
    assert_eq!(delegator.mode().await, OrchestrationMode::Subprocess);

    // Enabling orchestration after the first resolution changes nothing for
    // this facade instance.
    fs::write(
        dir.path().join("CLAUDE.md"),
        "CLAUDE_PM_ORCHESTRATION: ENABLED\n",
    )
    .unwrap();
    assert_eq!(delegator.mode().await, OrchestrationMode::Subprocess);
}

#[tokio::test]
async fn metrics_count_delegations_per_path() {
    let dir = TempDir::new().unwrap();
    let delegator = Delegator::new(
        dir.path(),
        Arc::new(ScriptedInvoker::single("ok")),
        Arc::new(StubDelegate::new()),
    )
    .with_mode(OrchestrationMode::Local);

    delegator
        .delegate_to_agent(&AgentType::Qa, "first")
        .await
        .unwrap();
    delegator
        .delegate_to_agent(&AgentType::Qa, "second")
        .await
        .unwrap();

    let metrics = delegator.metrics();
    assert_eq!(metrics.total_delegations, 2);
    assert_eq!(metrics.local_delegations, 2);
    assert_eq!(metrics.subprocess_delegations, 0);
    assert_eq!(metrics.fallback_delegations, 0);
    assert!(metrics.average_execution_ms >= 0.0);

    let dir = TempDir::new().unwrap();
    let delegator = Delegator::new(
        dir.path(),
        Arc::new(ScriptedInvoker::single("unused")),
        Arc::new(StubDelegate::new()),
    )
    .with_mode(OrchestrationMode::Subprocess);

    delegator
        .delegate_to_agent(&AgentType::Ops, "deploy")
        .await
        .unwrap();

    let metrics = delegator.metrics();
    assert_eq!(metrics.total_delegations, 1);
    assert_eq!(metrics.subprocess_delegations, 1);
    assert_eq!(metrics.local_delegations, 0);
}

#[tokio::test]
async fn delegations_are_visible_through_status_and_summary() {
    let dir = TempDir::new().unwrap();
    let delegator = Delegator::new(
        dir.path(),
        Arc::new(ScriptedInvoker::single(
            r#"{"result": "ok", "shared_updates": {"docs": ["NOTES.md"]}}"#,
        )),
        Arc::new(StubDelegate::new()),
    )
    .with_mode(OrchestrationMode::Local);

    delegator
        .delegate_to_agent(&AgentType::Documentation, "write notes")
        .await
        .unwrap();

    let status = delegator.get_agent_status(&AgentType::Documentation).await;
    assert!(status.worker_registered);
    assert_eq!(status.total_tasks, 1);
    assert_eq!(status.completed, 1);

    let summary = delegator.context_summary().await;
    assert!(summary.sections.contains(&"docs".to_string()));
    assert_eq!(summary.history_counts.get("documentation"), Some(&1));
}
