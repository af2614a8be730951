//! The flow engine: the entry point for executing workflows
//!
//! A [`FlowEngine`] owns the agent registry and the execution strategy chosen
//! at construction. Every call to [`FlowEngine::execute_workflow`] runs on a
//! fresh [`AgentSet`], so one engine can serve concurrent runs.

use fluxo_core::{Agent, Error, Payload, Result, Stage};
use fluxo_utils::WorkflowConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::approval::ApprovalPolicy;
use crate::envelope::WorkflowEnvelope;
use crate::flow_state::FlowState;
use crate::graph::{DEFAULT_STAGE_TIMEOUT, GraphExecutor, pipeline_graph};
use crate::registry::{AgentRegistry, AgentSet};
use crate::strategy::{DirectStrategy, ExecutionStrategy, FallbackStrategy, GraphStrategy};

/// Orchestrates the researcher → processor → approver → optimizer pipeline
///
/// # Example
///
/// ```no_run
/// use fluxo_core::Payload;
/// use fluxo_engine::FlowEngine;
/// use serde_json::json;
///
/// # async fn example() -> fluxo_core::Result<()> {
/// let engine = FlowEngine::builder().use_mock(true).build()?;
/// let input = Payload::new().with("query", json!("Analyze customer feedback trends"));
///
/// let envelope = engine.execute_workflow("wf-1", input).await;
/// assert!(envelope.is_completed());
/// # Ok(())
/// # }
/// ```
pub struct FlowEngine {
    registry: AgentRegistry,
    strategy: Box<dyn ExecutionStrategy>,
    use_mock: bool,
}

impl FlowEngine {
    /// Create a new engine builder
    pub fn builder() -> FlowEngineBuilder {
        FlowEngineBuilder::new()
    }

    /// Engine with default agents, configured from `config`
    pub fn from_config(config: &WorkflowConfig) -> Result<Self> {
        FlowEngineBuilder::new().config(config).build()
    }

    /// Execute the pipeline for one workflow
    ///
    /// Never fails: any error ends up in the returned envelope.
    pub async fn execute_workflow(&self, workflow_id: &str, input: Payload) -> WorkflowEnvelope {
        let mut agents = self.registry.new_run();
        self.execute_workflow_with(&mut agents, workflow_id, input).await
    }

    /// Execute the pipeline on a caller-owned agent set
    ///
    /// The agents' call histories and states are left in place afterwards,
    /// which lets callers inspect what each agent saw. A failed run reports
    /// the history of the initial state, since no final state exists.
    pub async fn execute_workflow_with(
        &self,
        agents: &mut AgentSet,
        workflow_id: &str,
        input: Payload,
    ) -> WorkflowEnvelope {
        info!(
            workflow_id,
            strategy = self.strategy.name(),
            "Starting workflow"
        );
        let initial = FlowState::new(workflow_id, input.clone());

        match self.strategy.run(workflow_id, &input, agents).await {
            Ok(state) => {
                info!(
                    workflow_id,
                    steps = state.history.len(),
                    "Workflow completed"
                );
                WorkflowEnvelope::completed(state)
            }
            Err(e) => {
                error!(workflow_id, error = %e, "Workflow failed");
                WorkflowEnvelope::failed(workflow_id, e.to_string(), initial.history)
            }
        }
    }

    /// Get a reference to the agent registry
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Whether the engine runs the direct strategy only
    pub fn uses_mock(&self) -> bool {
        self.use_mock
    }

    /// Name of the top-level strategy
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }
}

/// Builder for FlowEngine
pub struct FlowEngineBuilder {
    registry: AgentRegistry,
    use_mock: bool,
    max_retries: u32,
    stage_timeout: Duration,
    graph_executor: Option<Arc<dyn GraphExecutor>>,
    config_error: Option<String>,
}

impl FlowEngineBuilder {
    /// Create a builder with default agents and default workflow settings
    pub fn new() -> Self {
        let defaults = WorkflowConfig::default();
        Self {
            registry: AgentRegistry::new(),
            use_mock: defaults.use_mock,
            max_retries: defaults.max_retries,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            graph_executor: None,
            config_error: None,
        }
    }

    /// Use an existing agent registry
    pub fn registry(mut self, registry: AgentRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the agent bound to a stage
    pub fn agent(mut self, stage: Stage, agent: Arc<dyn Agent>) -> Self {
        self.registry.register(stage, agent);
        self
    }

    /// Select the direct strategy (`true`) or graph with fallback (`false`)
    pub fn use_mock(mut self, use_mock: bool) -> Self {
        self.use_mock = use_mock;
        self
    }

    /// Bound on approval rejections before the run fails
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Time budget for each stage call
    pub fn stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Apply workflow settings loaded from configuration
    ///
    /// An out-of-range timeout is reported by [`FlowEngineBuilder::build`].
    pub fn config(mut self, config: &WorkflowConfig) -> Self {
        match config.stage_timeout() {
            Ok(timeout) => self.stage_timeout = timeout,
            Err(e) => self.config_error = Some(e.to_string()),
        }
        self.use_mock(config.use_mock)
            .max_retries(config.max_retries)
    }

    /// Use a custom graph executor instead of the built-in pipeline graph
    pub fn graph_executor(mut self, executor: Arc<dyn GraphExecutor>) -> Self {
        self.graph_executor = Some(executor);
        self
    }

    /// Build the engine
    ///
    /// # Errors
    ///
    /// Returns an error if the workflow settings are invalid or the pipeline
    /// graph fails to compile
    pub fn build(self) -> Result<FlowEngine> {
        if let Some(reason) = self.config_error {
            return Err(Error::InitializationFailed(reason));
        }

        let policy = ApprovalPolicy::new(self.max_retries);
        let direct = DirectStrategy::new(policy, self.stage_timeout);

        let strategy: Box<dyn ExecutionStrategy> = if self.use_mock {
            info!("Flow engine using direct execution");
            Box::new(direct)
        } else {
            let executor = match self.graph_executor {
                Some(executor) => executor,
                None => Arc::new(pipeline_graph(policy, self.stage_timeout)?),
            };
            info!(
                executor = executor.name(),
                "Flow engine using graph execution with direct fallback"
            );
            Box::new(FallbackStrategy::new(
                Box::new(GraphStrategy::new(executor)),
                Box::new(direct),
            ))
        };

        Ok(FlowEngine {
            registry: self.registry,
            strategy,
            use_mock: self.use_mock,
        })
    }
}

impl Default for FlowEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
