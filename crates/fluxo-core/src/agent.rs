//! Core Agent trait definition and the stateful handle that drives it

use crate::state::{AgentConfig, AgentMessage, AgentState, StateUpdate, steps};
use crate::{Payload, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Core trait that all agents must implement
///
/// Agents are stateless: the same instance can be shared between concurrent
/// workflow runs. Everything that changes while a run is in flight (current
/// step, message log, metadata, call history) lives in an [`AgentHandle`]
/// owned by that run.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Compute the output mapping for one input mapping
    async fn process(&self, input: &Payload) -> Result<Payload>;

    /// Get the agent's name
    fn name(&self) -> &str;

    /// Get the agent's role description
    fn description(&self) -> &str;

    /// Step label reported while a call is in progress
    fn working_step(&self) -> &str;

    /// Task-relevant fields merged into the state metadata when a call starts
    fn task_metadata(&self, _input: &Payload) -> Payload {
        Payload::new()
    }

    /// Content of the human message logged for a completed call
    fn describe_input(&self, input: &Payload) -> String {
        serde_json::Value::Object(input.as_map().clone()).to_string()
    }
}

/// An agent together with the mutable state of one workflow run
///
/// # Example
///
/// ```no_run
/// use fluxo_core::{AgentHandle, Payload};
/// use std::sync::Arc;
///
/// # async fn example(agent: Arc<dyn fluxo_core::Agent>) -> fluxo_core::Result<()> {
/// let mut handle = AgentHandle::new(agent);
/// let output = handle.process(Payload::new()).await?;
///
/// assert_eq!(handle.call_history().len(), 1);
/// assert_eq!(handle.get_state().current_step, "complete");
/// # Ok(())
/// # }
/// ```
pub struct AgentHandle {
    agent: Arc<dyn Agent>,
    state: AgentState,
    call_history: Vec<Payload>,
}

impl AgentHandle {
    /// Wrap an agent with fresh state and an empty call history
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        debug!(agent = agent.name(), "Initialized agent handle");
        Self {
            agent,
            state: AgentState::default(),
            call_history: Vec::new(),
        }
    }

    /// Run one call through the agent
    ///
    /// The input is recorded in the call history before anything else, so a
    /// failing call still leaves its trace there. On failure the completion
    /// update is skipped and the error is returned as-is.
    pub async fn process(&mut self, input: Payload) -> Result<Payload> {
        self.call_history.push(input.clone());

        self.update_state(
            StateUpdate::step(self.agent.working_step())
                .with_metadata(self.agent.task_metadata(&input)),
        );

        let output = self.agent.process(&input).await?;

        let messages = vec![
            AgentMessage::human(self.agent.describe_input(&input)),
            AgentMessage::assistant(serde_json::to_string(&output)?),
        ];
        self.update_state(StateUpdate::step(steps::COMPLETE).with_messages(messages));

        Ok(output)
    }

    /// Apply an update to the agent state
    pub fn update_state(&mut self, update: StateUpdate) {
        self.state.apply(update);
        debug!(
            agent = self.agent.name(),
            step = %self.state.current_step,
            messages = self.state.messages.len(),
            "Updated agent state"
        );
    }

    /// Get the current agent state
    pub fn get_state(&self) -> &AgentState {
        &self.state
    }

    /// Reset the state to its defaults; the call history is kept
    pub fn reset(&mut self) {
        self.state = AgentState::default();
        info!(agent = self.agent.name(), "Reset agent state");
    }

    /// Every input this handle was asked to process, in call order
    pub fn call_history(&self) -> &[Payload] {
        &self.call_history
    }

    /// Read-only summary: name, description, current step
    pub fn config(&self) -> AgentConfig {
        AgentConfig {
            name: self.agent.name().to_string(),
            description: self.agent.description().to_string(),
            current_state: self.state.current_step.clone(),
        }
    }

    /// Get the agent's name
    pub fn name(&self) -> &str {
        self.agent.name()
    }

    /// Get the wrapped agent
    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("name", &self.agent.name())
            .field("state", &self.state)
            .field("calls", &self.call_history.len())
            .finish()
    }
}
