//! Stage → agent registry and the per-run agent set

use fluxo_core::{Agent, AgentConfig, AgentHandle, Stage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Catalogue entry describing the agent bound to a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
}

/// Registry mapping each pipeline stage to its agent implementation
///
/// Agents are stateless and shared; every run gets its own [`AgentSet`]
/// from [`AgentRegistry::new_run`], so concurrent runs never touch each
/// other's agent state.
#[derive(Clone)]
pub struct AgentRegistry {
    agents: BTreeMap<Stage, Arc<dyn Agent>>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self {
            agents: Stage::ALL
                .into_iter()
                .map(|stage| (stage, fluxo_agents::default_agent(stage)))
                .collect(),
        }
    }
}

impl AgentRegistry {
    /// Create a registry with the default agent for every stage
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the agent bound to a stage
    pub fn with_agent(mut self, stage: Stage, agent: Arc<dyn Agent>) -> Self {
        self.register(stage, agent);
        self
    }

    /// Replace the agent bound to a stage
    pub fn register(&mut self, stage: Stage, agent: Arc<dyn Agent>) {
        self.agents.insert(stage, agent);
    }

    /// Get the agent bound to a stage
    pub fn get(&self, stage: Stage) -> Option<Arc<dyn Agent>> {
        self.agents.get(&stage).cloned()
    }

    /// Fresh handles with empty state and history for one run
    pub fn new_run(&self) -> AgentSet {
        AgentSet {
            handles: self
                .agents
                .iter()
                .map(|(stage, agent)| (*stage, AgentHandle::new(Arc::clone(agent))))
                .collect(),
        }
    }

    /// Describe every registered agent in pipeline order
    pub fn catalogue(&self) -> Vec<AgentInfo> {
        self.agents
            .iter()
            .map(|(stage, agent)| AgentInfo {
                id: stage.agent_id().to_string(),
                name: agent.name().to_string(),
                description: agent.description().to_string(),
                capabilities: fluxo_agents::capabilities(*stage)
                    .iter()
                    .map(|c| (*c).to_string())
                    .collect(),
            })
            .collect()
    }

    /// Config summary of a fresh agent, looked up by agent id
    pub fn config(&self, agent_id: &str) -> Option<AgentConfig> {
        let stage = Stage::from_agent_id(agent_id)?;
        let agent = self.get(stage)?;
        Some(AgentHandle::new(agent).config())
    }
}

/// The agent handles owned by one workflow run
#[derive(Debug)]
pub struct AgentSet {
    handles: BTreeMap<Stage, AgentHandle>,
}

impl AgentSet {
    /// Get the handle for a stage
    pub fn get(&self, stage: Stage) -> Option<&AgentHandle> {
        self.handles.get(&stage)
    }

    /// Get the handle for a stage mutably
    pub fn get_mut(&mut self, stage: Stage) -> Option<&mut AgentHandle> {
        self.handles.get_mut(&stage)
    }

    /// Reset every agent's state; call histories are kept
    pub fn reset(&mut self) {
        for handle in self.handles.values_mut() {
            handle.reset();
        }
    }

    /// Iterate over handles in pipeline order
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &AgentHandle)> {
        self.handles.iter().map(|(stage, handle)| (*stage, handle))
    }
}
