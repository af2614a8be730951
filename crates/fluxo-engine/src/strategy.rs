//! Execution strategies for a workflow run
//!
//! - [`DirectStrategy`] calls the agents itself, in pipeline order.
//! - [`GraphStrategy`] hands the whole run to a [`GraphExecutor`].
//! - [`FallbackStrategy`] tries one strategy and, if it fails, runs another
//!   for the same call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fluxo_core::{Payload, Result, Stage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::approval::ApprovalPolicy;
use crate::flow_state::FlowState;
use crate::graph::GraphExecutor;
use crate::registry::AgentSet;
use crate::stages::{run_stage, stage_input};

/// One way of executing the pipeline for a workflow
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &str;

    /// Execute the pipeline and return the final state
    async fn run(
        &self,
        workflow_id: &str,
        input: &Payload,
        agents: &mut AgentSet,
    ) -> Result<FlowState>;
}

/// Sequential execution driven by the engine itself
///
/// All history entries share the timestamp taken when the run starts.
#[derive(Debug, Clone)]
pub struct DirectStrategy {
    policy: ApprovalPolicy,
    stage_timeout: Duration,
}

impl DirectStrategy {
    /// Create a direct strategy
    pub fn new(policy: ApprovalPolicy, stage_timeout: Duration) -> Self {
        Self {
            policy,
            stage_timeout,
        }
    }

    async fn step(
        &self,
        agents: &mut AgentSet,
        stage: Stage,
        input: &Payload,
        state: FlowState,
        timestamp: DateTime<Utc>,
    ) -> Result<FlowState> {
        let stage_in = stage_input(stage, input, &state.data);
        let output = run_stage(agents, stage, stage_in, self.stage_timeout).await?;
        Ok(state.advance(stage, output, timestamp))
    }
}

#[async_trait]
impl ExecutionStrategy for DirectStrategy {
    fn name(&self) -> &str {
        "direct"
    }

    async fn run(
        &self,
        workflow_id: &str,
        input: &Payload,
        agents: &mut AgentSet,
    ) -> Result<FlowState> {
        info!(workflow_id, "Using direct flow execution");
        let timestamp = Utc::now();

        let mut state = FlowState::new(workflow_id, Payload::new());
        state = self
            .step(agents, Stage::Research, input, state, timestamp)
            .await?;

        let mut attempts = 0;
        loop {
            state = self
                .step(agents, Stage::Process, input, state, timestamp)
                .await?;
            state = self
                .step(agents, Stage::Approve, input, state, timestamp)
                .await?;
            attempts += 1;

            if self.policy.next_stage(&state.data, attempts)? == Stage::Optimize {
                break;
            }
        }

        self.step(agents, Stage::Optimize, input, state, timestamp).await
    }
}

/// Delegates the run to a graph executor
pub struct GraphStrategy {
    executor: Arc<dyn GraphExecutor>,
}

impl GraphStrategy {
    /// Create a graph strategy around an executor
    pub fn new(executor: Arc<dyn GraphExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ExecutionStrategy for GraphStrategy {
    fn name(&self) -> &str {
        "graph"
    }

    async fn run(
        &self,
        workflow_id: &str,
        input: &Payload,
        agents: &mut AgentSet,
    ) -> Result<FlowState> {
        info!(
            workflow_id,
            executor = self.executor.name(),
            "Using graph flow execution"
        );
        let initial = FlowState::new(workflow_id, input.clone());
        self.executor.arun(initial, agents).await
    }
}

/// Runs `primary`, and `fallback` for the same call if `primary` fails
///
/// The fallback reuses the run's agent set, so call histories show every
/// attempt.
pub struct FallbackStrategy {
    primary: Box<dyn ExecutionStrategy>,
    fallback: Box<dyn ExecutionStrategy>,
}

impl FallbackStrategy {
    /// Compose two strategies
    pub fn new(primary: Box<dyn ExecutionStrategy>, fallback: Box<dyn ExecutionStrategy>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl ExecutionStrategy for FallbackStrategy {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn run(
        &self,
        workflow_id: &str,
        input: &Payload,
        agents: &mut AgentSet,
    ) -> Result<FlowState> {
        match self.primary.run(workflow_id, input, agents).await {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(
                    workflow_id,
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Primary strategy failed, falling back"
                );
                self.fallback.run(workflow_id, input, agents).await
            }
        }
    }
}
