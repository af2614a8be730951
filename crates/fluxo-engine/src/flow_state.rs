//! Per-run flow state and execution history

use chrono::{DateTime, Utc};
use fluxo_core::{Payload, Stage, steps};
use serde::{Deserialize, Serialize};

/// One completed stage in a run's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub step: String,
    pub timestamp: DateTime<Utc>,
}

/// State of a single workflow execution
///
/// Each completed stage produces a new, richer state through
/// [`FlowState::advance`]; a state is never edited in place by a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowState {
    pub workflow_id: String,
    /// Last completed stage
    pub current_step: String,
    /// Stage outputs keyed by [`Stage::result_key`]
    pub data: Payload,
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlowState {
    /// Create a state that has not completed any stage yet
    pub fn new(workflow_id: impl Into<String>, data: Payload) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            current_step: steps::START.to_string(),
            data,
            history: Vec::new(),
            error: None,
        }
    }

    /// The state after `stage` completed with `output` at `timestamp`
    pub fn advance(self, stage: Stage, output: Payload, timestamp: DateTime<Utc>) -> Self {
        let mut data = self.data;
        data.insert(stage.result_key(), output.into_value());

        let mut history = self.history;
        history.push(HistoryEntry {
            step: stage.as_str().to_string(),
            timestamp,
        });

        Self {
            workflow_id: self.workflow_id,
            current_step: stage.as_str().to_string(),
            data,
            history,
            error: None,
        }
    }

    /// How many times `stage` has completed in this run
    pub fn completions(&self, stage: Stage) -> usize {
        self.history
            .iter()
            .filter(|entry| entry.step == stage.as_str())
            .count()
    }

    /// Stage names in completion order
    pub fn steps(&self) -> Vec<&str> {
        self.history
            .iter()
            .map(|entry| entry.step.as_str())
            .collect()
    }
}
