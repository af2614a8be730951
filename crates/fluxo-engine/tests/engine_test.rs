//! End-to-end tests for FlowEngine
//!
//! Covers both strategies, the graph → direct fallback, failure envelopes,
//! approval retries, stage timeouts and concurrent runs on one engine.

use async_trait::async_trait;
use fluxo_core::{Agent, Error, Payload, Result, Stage};
use fluxo_engine::{
    AgentSet, FlowEngine, FlowState, GraphExecutor, WorkflowEnvelope, WorkflowStatus,
};
use mockall::mock;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

// ============================================================================
// Test agents and executors
// ============================================================================

struct FailingAgent;

#[async_trait]
impl Agent for FailingAgent {
    async fn process(&self, _input: &Payload) -> Result<Payload> {
        Err(Error::ProcessingFailed("researcher unavailable".to_string()))
    }

    fn name(&self) -> &str {
        "Failing"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn working_step(&self) -> &str {
        "researching"
    }
}

struct SlowAgent(Duration);

#[async_trait]
impl Agent for SlowAgent {
    async fn process(&self, _input: &Payload) -> Result<Payload> {
        tokio::time::sleep(self.0).await;
        Ok(Payload::new())
    }

    fn name(&self) -> &str {
        "Slow"
    }

    fn description(&self) -> &str {
        "Takes its time"
    }

    fn working_step(&self) -> &str {
        "processing"
    }
}

/// Rejects the first `rejections` calls, then approves
struct CountingApprover {
    rejections: u32,
    calls: AtomicU32,
}

impl CountingApprover {
    fn new(rejections: u32) -> Arc<Self> {
        Arc::new(Self {
            rejections,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl Agent for CountingApprover {
    async fn process(&self, _input: &Payload) -> Result<Payload> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Payload::new()
            .with("approved", json!(call >= self.rejections))
            .with("feedback", json!("needs more detail")))
    }

    fn name(&self) -> &str {
        "Counting"
    }

    fn description(&self) -> &str {
        "Rejects a fixed number of times"
    }

    fn working_step(&self) -> &str {
        "validating"
    }
}

/// Executor with no async entry point
struct SyncOnlyExecutor;

#[async_trait]
impl GraphExecutor for SyncOnlyExecutor {
    fn name(&self) -> &'static str {
        "sync_only"
    }
}

mock! {
    pub Executor {}

    #[async_trait]
    impl GraphExecutor for Executor {
        fn name(&self) -> &'static str;
        async fn arun(&self, initial: FlowState, agents: &mut AgentSet) -> Result<FlowState>;
    }
}

fn sample_input() -> Payload {
    Payload::try_from(json!({
        "query": "trends",
        "constraints": {"min_confidence": 0.8}
    }))
    .unwrap()
}

fn steps(envelope: &WorkflowEnvelope) -> Vec<&str> {
    envelope
        .history
        .iter()
        .map(|entry| entry.step.as_str())
        .collect()
}

fn assert_full_result(envelope: &WorkflowEnvelope) {
    assert_eq!(envelope.status, WorkflowStatus::Completed);
    assert!(envelope.error.is_none());
    assert_eq!(
        steps(envelope),
        ["research", "process", "approve", "optimize"]
    );

    let result = envelope.result.as_ref().unwrap();
    for stage in Stage::ALL {
        let key = stage.result_key();
        assert!(result.contains_key(key), "missing {key}");
    }
    assert_eq!(result.get("approval").unwrap()["approved"], json!(true));
}

// ============================================================================
// Strategies
// ============================================================================

#[tokio::test]
async fn test_direct_strategy_completes() {
    let engine = FlowEngine::builder().use_mock(true).build().unwrap();
    let envelope = engine.execute_workflow("wf-1", sample_input()).await;

    assert_eq!(envelope.workflow_id, "wf-1");
    assert_full_result(&envelope);
}

#[tokio::test]
async fn test_graph_strategy_completes() {
    let engine = FlowEngine::builder().use_mock(false).build().unwrap();
    let envelope = engine.execute_workflow("wf-graph", sample_input()).await;

    assert_full_result(&envelope);
    let times: Vec<_> = envelope
        .history
        .iter()
        .map(|entry| entry.timestamp)
        .collect();
    assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn test_executor_without_async_run_falls_back() {
    let engine = FlowEngine::builder()
        .use_mock(false)
        .graph_executor(Arc::new(SyncOnlyExecutor))
        .build()
        .unwrap();

    let envelope = engine.execute_workflow("wf-fallback", sample_input()).await;
    assert_full_result(&envelope);
}

#[tokio::test]
async fn test_failing_executor_is_tried_once_per_call() {
    let mut executor = MockExecutor::new();
    executor.expect_name().return_const("mock_graph");
    executor
        .expect_arun()
        .times(2)
        .returning(|_, _| Err(Error::Generic("graph crashed".to_string())));

    let engine = FlowEngine::builder()
        .use_mock(false)
        .graph_executor(Arc::new(executor))
        .build()
        .unwrap();

    assert_full_result(&engine.execute_workflow("wf-a", sample_input()).await);
    assert_full_result(&engine.execute_workflow("wf-b", sample_input()).await);
}

#[tokio::test]
async fn test_executor_receives_caller_input() {
    let mut executor = MockExecutor::new();
    executor.expect_name().return_const("mock_graph");
    executor
        .expect_arun()
        .withf(|initial, _| {
            initial.workflow_id == "wf-in"
                && initial.current_step == "start"
                && initial.history.is_empty()
                && initial.data.get_str("query") == Some("trends")
        })
        .times(1)
        .returning(|initial, _| Ok(FlowState::new(initial.workflow_id, Payload::new())));

    let engine = FlowEngine::builder()
        .use_mock(false)
        .graph_executor(Arc::new(executor))
        .build()
        .unwrap();

    let envelope = engine.execute_workflow("wf-in", sample_input()).await;
    assert!(envelope.is_completed());
    assert!(envelope.history.is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_agent_failure_becomes_error_envelope() {
    let engine = FlowEngine::builder()
        .use_mock(true)
        .agent(Stage::Research, Arc::new(FailingAgent))
        .build()
        .unwrap();
    let mut agents = engine.registry().new_run();

    let envelope = engine
        .execute_workflow_with(&mut agents, "wf-fail", sample_input())
        .await;

    assert_eq!(envelope.status, WorkflowStatus::Error);
    assert!(envelope.result.is_none());
    assert!(envelope.history.is_empty());
    assert!(
        envelope
            .error
            .as_deref()
            .is_some_and(|e| e.contains("researcher unavailable"))
    );

    let researcher = agents.get(Stage::Research).unwrap();
    assert_eq!(researcher.call_history().len(), 1);
    let processor = agents.get(Stage::Process).unwrap();
    assert!(processor.call_history().is_empty());
}

#[tokio::test]
async fn test_agent_failure_with_graph_reaches_fallback() {
    let engine = FlowEngine::builder()
        .use_mock(false)
        .agent(Stage::Research, Arc::new(FailingAgent))
        .build()
        .unwrap();
    let mut agents = engine.registry().new_run();

    let envelope = engine
        .execute_workflow_with(&mut agents, "wf-fail", sample_input())
        .await;

    assert_eq!(envelope.status, WorkflowStatus::Error);
    // once by the graph, once by the direct fallback
    let researcher = agents.get(Stage::Research).unwrap();
    assert_eq!(researcher.call_history().len(), 2);
}

#[tokio::test]
async fn test_stage_timeout() {
    let engine = FlowEngine::builder()
        .use_mock(true)
        .stage_timeout(Duration::from_millis(20))
        .agent(Stage::Process, Arc::new(SlowAgent(Duration::from_secs(5))))
        .build()
        .unwrap();

    let envelope = engine.execute_workflow("wf-slow", sample_input()).await;

    assert_eq!(envelope.status, WorkflowStatus::Error);
    let error = envelope.error.unwrap();
    assert!(error.contains("timed out"), "{error}");
    assert!(error.contains("process"), "{error}");
}

#[tokio::test]
async fn test_graph_stage_timeout_reaches_fallback() {
    let slow = Arc::new(SlowAgent(Duration::from_millis(200)));
    let engine = FlowEngine::builder()
        .use_mock(false)
        .stage_timeout(Duration::from_millis(20))
        .agent(Stage::Process, slow)
        .build()
        .unwrap();
    let mut agents = engine.registry().new_run();

    let envelope = engine
        .execute_workflow_with(&mut agents, "wf-slow-graph", sample_input())
        .await;

    assert_eq!(envelope.status, WorkflowStatus::Error);
    let error = envelope.error.unwrap();
    assert!(error.contains("timed out"), "{error}");
    // once by the graph, once by the direct fallback
    let processor = agents.get(Stage::Process).unwrap();
    assert_eq!(processor.call_history().len(), 2);
}

// ============================================================================
// Approval loop
// ============================================================================

#[tokio::test]
async fn test_rejection_is_reprocessed_with_feedback() {
    for use_mock in [true, false] {
        let engine = FlowEngine::builder()
            .use_mock(use_mock)
            .agent(Stage::Approve, CountingApprover::new(1))
            .build()
            .unwrap();
        let mut agents = engine.registry().new_run();

        let envelope = engine
            .execute_workflow_with(&mut agents, "wf-retry", sample_input())
            .await;

        assert!(envelope.is_completed(), "use_mock={use_mock}");
        assert_eq!(
            steps(&envelope),
            [
                "research", "process", "approve", "process", "approve", "optimize"
            ]
        );

        let processor = agents.get(Stage::Process).unwrap();
        assert_eq!(processor.call_history().len(), 2);
        assert!(!processor.call_history()[0].contains_key("feedback"));
        assert_eq!(
            processor.call_history()[1].get_str("feedback"),
            Some("needs more detail")
        );
    }
}

#[tokio::test]
async fn test_endless_rejection_fails_the_run() {
    for use_mock in [true, false] {
        let engine = FlowEngine::builder()
            .use_mock(use_mock)
            .max_retries(2)
            .agent(Stage::Approve, CountingApprover::new(u32::MAX))
            .build()
            .unwrap();
        let mut agents = engine.registry().new_run();

        let envelope = engine
            .execute_workflow_with(&mut agents, "wf-reject", sample_input())
            .await;

        assert_eq!(
            envelope.status,
            WorkflowStatus::Error,
            "use_mock={use_mock}"
        );
        assert!(envelope.error.unwrap().contains("after 3 attempts"));
        let optimizer = agents.get(Stage::Optimize).unwrap();
        assert!(optimizer.call_history().is_empty());
    }
}

// ============================================================================
// Concurrency and repeatability
// ============================================================================

#[tokio::test]
async fn test_concurrent_runs_share_one_engine() {
    let engine = FlowEngine::builder().use_mock(false).build().unwrap();
    let ids: Vec<String> = (0..8).map(|i| format!("wf-{i}")).collect();

    let runs = ids
        .iter()
        .map(|id| engine.execute_workflow(id, sample_input()));
    let envelopes = futures::future::join_all(runs).await;

    for (id, envelope) in ids.iter().zip(&envelopes) {
        assert_eq!(&envelope.workflow_id, id);
        assert_full_result(envelope);
    }
}

#[tokio::test]
async fn test_repeated_runs_have_same_shape() {
    let engine = FlowEngine::builder().build().unwrap();
    let first = engine.execute_workflow("wf-x", sample_input()).await;
    let second = engine.execute_workflow("wf-x", sample_input()).await;

    assert_eq!(steps(&first), steps(&second));
    assert_eq!(first.result, second.result);
}

#[tokio::test]
async fn test_envelope_json_shape() {
    let engine = FlowEngine::builder().build().unwrap();
    let envelope = engine.execute_workflow("wf-json", sample_input()).await;
    let value = serde_json::to_value(&envelope).unwrap();

    assert_eq!(value["workflow_id"], json!("wf-json"));
    assert_eq!(value["status"], json!("completed"));
    assert!(value.get("error").is_none());
    assert_eq!(value["history"][0]["step"], json!("research"));
    assert!(value["history"][0]["timestamp"].is_string());
}
