//! Output records produced by the pipeline agents

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Researcher output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchFindings {
    pub findings: String,
    pub sources: Vec<String>,
    /// Confidence in the findings, 0.0 to 1.0
    pub confidence: f64,
}

/// Processor output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub result: String,
    pub status: String,
    pub metrics: ProcessingMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Seconds
    pub processing_time: f64,
    pub accuracy: f64,
}

/// Approver output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub approved: bool,
    pub feedback: String,
    pub confidence: f64,
    pub metrics: ApprovalMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalMetrics {
    pub quality_score: f64,
    pub compliance_score: f64,
}

/// Optimizer output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub optimizations: Vec<Optimization>,
    pub impact_analysis: BTreeMap<String, String>,
    /// Ordered implementation steps
    pub implementation_plan: Vec<String>,
}

/// A single suggested change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    pub component: String,
    pub suggestion: String,
    pub expected_improvement: String,
}
