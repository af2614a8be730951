//! Processing agent: executes the core workflow task

use async_trait::async_trait;
use fluxo_core::{Agent, Payload, Result, keys};
use tracing::debug;

use crate::outputs::{ProcessingMetrics, ProcessingResult};
use crate::value_text;

/// Agent that executes core workflow processing tasks
#[derive(Debug, Default)]
pub struct ProcessorAgent;

impl ProcessorAgent {
    /// Create a new processor agent
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent for ProcessorAgent {
    async fn process(&self, input: &Payload) -> Result<Payload> {
        debug!(
            task = ?input.get(keys::TASK),
            retry = input.contains_key(keys::FEEDBACK),
            "Processing"
        );

        let result = ProcessingResult {
            result: "Task processed successfully".to_string(),
            status: "completed".to_string(),
            metrics: ProcessingMetrics {
                processing_time: 1.5,
                accuracy: 0.92,
            },
        };

        Payload::from_serializable(&result)
    }

    fn name(&self) -> &str {
        "Processor"
    }

    fn description(&self) -> &str {
        "Executes core workflow processing tasks"
    }

    fn working_step(&self) -> &str {
        "processing"
    }

    fn task_metadata(&self, input: &Payload) -> Payload {
        Payload::new()
            .with(keys::TASK, input.get_or_null(keys::TASK))
            .with(keys::PARAMETERS, input.get_or_null(keys::PARAMETERS))
    }

    fn describe_input(&self, input: &Payload) -> String {
        value_text(input.get(keys::TASK))
    }
}
