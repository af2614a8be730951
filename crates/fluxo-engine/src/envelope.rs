//! Normalized result envelope returned by the engine

use fluxo_core::Payload;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::flow_state::{FlowState, HistoryEntry};

/// Outcome of a workflow execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Completed,
    Error,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Completed => write!(f, "completed"),
            WorkflowStatus::Error => write!(f, "error"),
        }
    }
}

/// What a caller receives from [`crate::FlowEngine::execute_workflow`]
///
/// `result` is present only on success and `error` only on failure;
/// `history` is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEnvelope {
    pub workflow_id: String,
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub history: Vec<HistoryEntry>,
}

impl WorkflowEnvelope {
    /// Envelope for a run that produced a final state
    pub fn completed(state: FlowState) -> Self {
        Self {
            workflow_id: state.workflow_id,
            status: WorkflowStatus::Completed,
            result: Some(state.data),
            error: None,
            history: state.history,
        }
    }

    /// Envelope for a run that failed
    pub fn failed(
        workflow_id: impl Into<String>,
        error: impl Into<String>,
        history: Vec<HistoryEntry>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            status: WorkflowStatus::Error,
            result: None,
            error: Some(error.into()),
            history,
        }
    }

    /// Whether the run completed
    pub fn is_completed(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }
}
