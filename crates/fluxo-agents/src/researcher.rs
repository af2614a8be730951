//! Research agent: gathers information for a workflow task

use async_trait::async_trait;
use fluxo_core::{Agent, Payload, Result, keys};
use tracing::debug;

use crate::outputs::ResearchFindings;
use crate::value_text;

/// Agent that gathers and analyzes information for workflow tasks
///
/// Reads `query`, `context` and `constraints` from its input and returns
/// `findings`, `sources` and a `confidence` score.
#[derive(Debug, Default)]
pub struct ResearcherAgent;

impl ResearcherAgent {
    /// Create a new researcher agent
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent for ResearcherAgent {
    async fn process(&self, input: &Payload) -> Result<Payload> {
        debug!(query = ?input.get(keys::QUERY), "Researching");

        // Placeholder findings until a retrieval backend is wired in
        let findings = ResearchFindings {
            findings: "Placeholder research findings".to_string(),
            sources: vec!["source1".to_string(), "source2".to_string()],
            confidence: 0.85,
        };

        Payload::from_serializable(&findings)
    }

    fn name(&self) -> &str {
        "Researcher"
    }

    fn description(&self) -> &str {
        "Gathers and analyzes information for workflow tasks"
    }

    fn working_step(&self) -> &str {
        "researching"
    }

    fn task_metadata(&self, input: &Payload) -> Payload {
        Payload::new()
            .with(keys::QUERY, input.get_or_null(keys::QUERY))
            .with(keys::CONTEXT, input.get_or_null(keys::CONTEXT))
    }

    fn describe_input(&self, input: &Payload) -> String {
        value_text(input.get(keys::QUERY))
    }
}
