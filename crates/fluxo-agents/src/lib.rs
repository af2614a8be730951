//! Pipeline agents for fluxo
//!
//! The four agents that make up the research → process → approve → optimize
//! pipeline. Their business logic is placeholder content; the output shapes
//! (see [`outputs`]) are what the engine and callers rely on.

pub mod approver;
pub mod optimizer;
pub mod outputs;
pub mod processor;
pub mod researcher;

pub use approver::ApproverAgent;
pub use optimizer::OptimizerAgent;
pub use outputs::{
    ApprovalDecision, ApprovalMetrics, Optimization, OptimizationReport, ProcessingMetrics,
    ProcessingResult, ResearchFindings,
};
pub use processor::ProcessorAgent;
pub use researcher::ResearcherAgent;

use fluxo_core::{Agent, Stage};
use serde_json::Value;
use std::sync::Arc;

/// The default agent bound to a stage
pub fn default_agent(stage: Stage) -> Arc<dyn Agent> {
    match stage {
        Stage::Research => Arc::new(ResearcherAgent::new()),
        Stage::Process => Arc::new(ProcessorAgent::new()),
        Stage::Approve => Arc::new(ApproverAgent::new()),
        Stage::Optimize => Arc::new(OptimizerAgent::new()),
    }
}

/// Human-readable capabilities of the default agent for a stage
pub fn capabilities(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Research => &["Document analysis"],
        Stage::Process => &["Task processing"],
        Stage::Approve => &["Quality validation"],
        Stage::Optimize => &["Performance optimization"],
    }
}

/// Render an optional JSON value as message text
pub(crate) fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    }
}
