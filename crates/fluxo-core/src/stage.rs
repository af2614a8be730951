//! Named pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One named step of the research → process → approve → optimize pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Research,
    Process,
    Approve,
    Optimize,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 4] = [
        Stage::Research,
        Stage::Process,
        Stage::Approve,
        Stage::Optimize,
    ];

    /// Stage name as used in history entries and graph nodes
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Research => "research",
            Stage::Process => "process",
            Stage::Approve => "approve",
            Stage::Optimize => "optimize",
        }
    }

    /// Key under which the stage output is stored in the flow data
    pub fn result_key(&self) -> &'static str {
        match self {
            Stage::Research => "research_results",
            Stage::Process => "processed_data",
            Stage::Approve => "approval",
            Stage::Optimize => "optimization",
        }
    }

    /// Identifier of the agent bound to this stage
    pub fn agent_id(&self) -> &'static str {
        match self {
            Stage::Research => "researcher",
            Stage::Process => "processor",
            Stage::Approve => "approver",
            Stage::Optimize => "optimizer",
        }
    }

    /// Look a stage up by its agent identifier
    pub fn from_agent_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.agent_id() == id.to_lowercase())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s.to_lowercase())
            .ok_or_else(|| crate::Error::Generic(format!("Unknown stage: {s}")))
    }
}
