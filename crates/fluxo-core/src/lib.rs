//! Core abstractions for fluxo pipelines
//!
//! This crate defines the fundamental traits and types shared by the agents
//! and the flow engine: the stateless [`Agent`] trait, the per-run
//! [`AgentHandle`] that owns an agent's state and call history, the JSON
//! [`Payload`] exchanged between stages, and the pipeline [`Stage`] names.

pub mod agent;
pub mod error;
pub mod payload;
pub mod stage;
pub mod state;

pub use agent::{Agent, AgentHandle};
pub use error::{Error, Result};
pub use payload::{Payload, is_truthy, keys};
pub use stage::Stage;
pub use state::{AgentConfig, AgentMessage, AgentState, MessageRole, StateUpdate, steps};
