//! Per-agent state: current step, message log, and metadata

use crate::Payload;
use serde::{Deserialize, Serialize};

/// Well-known step labels shared by every agent
pub mod steps {
    /// Freshly constructed or reset
    pub const START: &str = "start";
    /// Last process call finished
    pub const COMPLETE: &str = "complete";
}

/// Author of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// What the agent was asked
    Human,
    /// What the agent produced
    Assistant,
}

/// A role-tagged entry in an agent's message log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: MessageRole,
    pub content: String,
}

impl AgentMessage {
    /// Create a human message
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Human,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Mutable state owned by one agent handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub current_step: String,
    pub messages: Vec<AgentMessage>,
    pub metadata: Payload,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            current_step: steps::START.to_string(),
            messages: Vec::new(),
            metadata: Payload::new(),
        }
    }
}

impl AgentState {
    /// Apply an update: replace the step, append messages, merge metadata
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(step) = update.current_step {
            self.current_step = step;
        }
        self.messages.extend(update.messages);
        if let Some(metadata) = update.metadata {
            self.metadata.merge(metadata);
        }
    }
}

/// A partial change to an [`AgentState`]
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub current_step: Option<String>,
    pub messages: Vec<AgentMessage>,
    pub metadata: Option<Payload>,
}

impl StateUpdate {
    /// Start an update that moves the agent to `step`
    pub fn step(step: impl Into<String>) -> Self {
        Self {
            current_step: Some(step.into()),
            ..Self::default()
        }
    }

    /// Attach metadata to merge
    pub fn with_metadata(mut self, metadata: Payload) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach messages to append
    pub fn with_messages(mut self, messages: Vec<AgentMessage>) -> Self {
        self.messages = messages;
        self
    }
}

/// Read-only summary of an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub description: String,
    pub current_state: String,
}
