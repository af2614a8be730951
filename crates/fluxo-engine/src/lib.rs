//! Multi-agent flow engine for fluxo
//!
//! This crate runs the research → process → approve → optimize pipeline.
//! A [`FlowEngine`] picks one of two strategies when it is built: direct
//! sequential execution, or a compiled [`StateGraph`] with the direct
//! strategy as a per-call fallback. Either way the caller gets a
//! [`WorkflowEnvelope`] and never an error.
//!
//! [`WorkflowRunner`] adds bookkeeping on top of the engine through a
//! [`WorkflowStore`].

pub mod approval;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod flow_state;
pub mod graph;
pub mod registry;
pub mod runner;
pub mod stages;
pub mod store;
pub mod strategy;

// Re-export for convenience
pub use approval::ApprovalPolicy;
pub use engine::{FlowEngine, FlowEngineBuilder};
pub use envelope::{WorkflowEnvelope, WorkflowStatus};
pub use error::{StoreError, StoreResult};
pub use flow_state::{FlowState, HistoryEntry};
pub use graph::{
    CompiledGraph, DEFAULT_RECURSION_LIMIT, DEFAULT_STAGE_TIMEOUT, GraphExecutor, Router,
    StateGraph, pipeline_graph,
};
pub use registry::{AgentInfo, AgentRegistry, AgentSet};
pub use runner::WorkflowRunner;
pub use store::{
    ExecutionRecord, InMemoryWorkflowStore, RecordStatus, WorkflowRecord, WorkflowStore,
};
pub use strategy::{DirectStrategy, ExecutionStrategy, FallbackStrategy, GraphStrategy};
