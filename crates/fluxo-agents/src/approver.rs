//! Approval agent: validates processing results

use async_trait::async_trait;
use fluxo_core::{Agent, Payload, Result, keys};
use tracing::debug;

use crate::outputs::{ApprovalDecision, ApprovalMetrics};
use crate::value_text;

/// Agent that validates and approves workflow outputs
///
/// The `approved` field of its output drives the engine's approval branch.
#[derive(Debug, Default)]
pub struct ApproverAgent;

impl ApproverAgent {
    /// Create a new approver agent
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent for ApproverAgent {
    async fn process(&self, input: &Payload) -> Result<Payload> {
        debug!(criteria = ?input.get(keys::CRITERIA), "Validating");

        let decision = ApprovalDecision {
            approved: true,
            feedback: "All validation criteria met".to_string(),
            confidence: 0.95,
            metrics: ApprovalMetrics {
                quality_score: 0.88,
                compliance_score: 0.92,
            },
        };

        Payload::from_serializable(&decision)
    }

    fn name(&self) -> &str {
        "Approver"
    }

    fn description(&self) -> &str {
        "Validates and approves workflow outputs"
    }

    fn working_step(&self) -> &str {
        "validating"
    }

    fn task_metadata(&self, input: &Payload) -> Payload {
        Payload::new()
            .with(keys::RESULT, input.get_or_null(keys::RESULT))
            .with(keys::CRITERIA, input.get_or_null(keys::CRITERIA))
    }

    fn describe_input(&self, input: &Payload) -> String {
        format!("Validating result: {}", value_text(input.get(keys::RESULT)))
    }
}
