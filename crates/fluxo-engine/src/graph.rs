//! Directed-graph execution of pipeline stages
//!
//! [`StateGraph`] describes nodes (each bound to a [`Stage`]), plain edges,
//! and conditional edges chosen by a router over the current [`FlowState`].
//! Compiling it yields a [`CompiledGraph`], the built-in [`GraphExecutor`].

use async_trait::async_trait;
use chrono::Utc;
use fluxo_core::{Error, Payload, Result, Stage};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::approval::ApprovalPolicy;
use crate::flow_state::FlowState;
use crate::registry::AgentSet;
use crate::stages::{run_stage, stage_input};

/// Default cap on node visits per run
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Default per-stage timeout for graphs that do not set one
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Chooses a branch name from the current state
pub type Router = Arc<dyn Fn(&FlowState) -> Result<String> + Send + Sync>;

/// A graph runner the engine can delegate a whole run to
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    /// Executor name for logs and errors
    fn name(&self) -> &'static str;

    /// Run the graph to completion starting from `initial`
    ///
    /// `initial.data` carries the caller input. Executors without an async
    /// entry point keep this default, which fails the attempt.
    async fn arun(&self, _initial: FlowState, _agents: &mut AgentSet) -> Result<FlowState> {
        Err(Error::UnsupportedExecutor(format!(
            "'{}' does not support async execution",
            self.name()
        )))
    }
}

enum Transition {
    Edge(String),
    Conditional {
        router: Router,
        branches: HashMap<String, String>,
    },
}

/// Builder for a stage graph
pub struct StateGraph {
    nodes: HashMap<String, Stage>,
    transitions: HashMap<String, Transition>,
    entry: Option<String>,
    finish: Option<String>,
    recursion_limit: usize,
    stage_timeout: Duration,
    problems: Vec<String>,
}

impl Default for StateGraph {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            transitions: HashMap::new(),
            entry: None,
            finish: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            problems: Vec::new(),
        }
    }
}

impl StateGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node that runs the agent bound to `stage`
    pub fn add_node(mut self, name: impl Into<String>, stage: Stage) -> Self {
        let name = name.into();
        if self.nodes.insert(name.clone(), stage).is_some() {
            self.problems.push(format!("duplicate node '{name}'"));
        }
        self
    }

    /// Add an unconditional edge
    pub fn add_edge(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let from = from.into();
        self.add_transition(from, Transition::Edge(to.into()))
    }

    /// Add a conditional edge: `router` returns a key of `branches`
    pub fn add_conditional_edges<F, I, K, V>(
        self,
        from: impl Into<String>,
        router: F,
        branches: I,
    ) -> Self
    where
        F: Fn(&FlowState) -> Result<String> + Send + Sync + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let branches = branches
            .into_iter()
            .map(|(key, target)| (key.into(), target.into()))
            .collect();
        self.add_transition(
            from.into(),
            Transition::Conditional {
                router: Arc::new(router),
                branches,
            },
        )
    }

    fn add_transition(mut self, from: String, transition: Transition) -> Self {
        if self.transitions.contains_key(&from) {
            self.problems.push(format!("node '{from}' has more than one outgoing rule"));
        } else {
            self.transitions.insert(from, transition);
        }
        self
    }

    /// Set the first node to run
    pub fn set_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Set the node after which the run ends
    pub fn set_finish_point(mut self, name: impl Into<String>) -> Self {
        self.finish = Some(name.into());
        self
    }

    /// Cap the number of node visits per run
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Time budget for each node's stage call
    pub fn stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Validate the graph and freeze it for execution
    pub fn compile(self) -> Result<CompiledGraph> {
        let mut problems = self.problems;

        let entry = self.entry.unwrap_or_else(|| {
            problems.push("no entry point".to_string());
            String::new()
        });
        let finish = self.finish.unwrap_or_else(|| {
            problems.push("no finish point".to_string());
            String::new()
        });

        for point in [&entry, &finish] {
            if !point.is_empty() && !self.nodes.contains_key(point) {
                problems.push(format!("unknown node '{point}'"));
            }
        }

        for (from, transition) in &self.transitions {
            if !self.nodes.contains_key(from) {
                problems.push(format!("edge from unknown node '{from}'"));
            }
            let targets: Vec<&String> = match transition {
                Transition::Edge(to) => vec![to],
                Transition::Conditional { branches, .. } => branches.values().collect(),
            };
            for to in targets {
                if !self.nodes.contains_key(to) {
                    problems.push(format!("edge from '{from}' to unknown node '{to}'"));
                }
            }
        }

        for name in self.nodes.keys() {
            if *name != finish && !self.transitions.contains_key(name) {
                problems.push(format!("node '{name}' has no outgoing edge"));
            }
        }

        if !problems.is_empty() {
            problems.sort();
            return Err(Error::InvalidGraph(problems.join("; ")));
        }

        Ok(CompiledGraph {
            nodes: self.nodes,
            transitions: self.transitions,
            entry,
            finish,
            recursion_limit: self.recursion_limit,
            stage_timeout: self.stage_timeout,
        })
    }
}

/// A validated stage graph, ready to run
pub struct CompiledGraph {
    nodes: HashMap<String, Stage>,
    transitions: HashMap<String, Transition>,
    entry: String,
    finish: String,
    recursion_limit: usize,
    stage_timeout: Duration,
}

impl CompiledGraph {
    /// Name of the entry node
    pub fn entry_point(&self) -> &str {
        &self.entry
    }

    /// Name of the finish node
    pub fn finish_point(&self) -> &str {
        &self.finish
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn next_node(&self, current: &str, state: &FlowState) -> Result<String> {
        match self.transitions.get(current) {
            Some(Transition::Edge(to)) => Ok(to.clone()),
            Some(Transition::Conditional { router, branches }) => {
                let branch = router(state)?;
                branches.get(&branch).cloned().ok_or_else(|| {
                    Error::InvalidGraph(format!(
                        "router on '{current}' chose unknown branch '{branch}'"
                    ))
                })
            }
            None => Err(Error::InvalidGraph(format!("node '{current}' has no outgoing edge"))),
        }
    }
}

impl fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("nodes", &self.nodes)
            .field("entry", &self.entry)
            .field("finish", &self.finish)
            .field("recursion_limit", &self.recursion_limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GraphExecutor for CompiledGraph {
    fn name(&self) -> &'static str {
        "state_graph"
    }

    async fn arun(&self, initial: FlowState, agents: &mut AgentSet) -> Result<FlowState> {
        let FlowState {
            workflow_id,
            data: input,
            history,
            ..
        } = initial;
        let mut state = FlowState::new(workflow_id, Payload::new());
        state.history = history;

        let mut current = self.entry.clone();
        let mut visits = 0;

        loop {
            visits += 1;
            if visits > self.recursion_limit {
                return Err(Error::Generic(format!(
                    "Recursion limit of {} node visits reached",
                    self.recursion_limit
                )));
            }

            let Some(&stage) = self.nodes.get(&current) else {
                return Err(Error::InvalidGraph(format!("unknown node '{current}'")));
            };
            debug!(node = %current, visit = visits, "Entering graph node");

            let stage_in = stage_input(stage, &input, &state.data);
            let output = run_stage(agents, stage, stage_in, self.stage_timeout).await?;
            state = state.advance(stage, output, Utc::now());

            if current == self.finish {
                info!(
                    workflow_id = %state.workflow_id,
                    steps = state.history.len(),
                    "Graph reached finish point"
                );
                return Ok(state);
            }

            current = self.next_node(&current, &state)?;
        }
    }
}

/// The research → process → approve → (optimize | process) graph
pub fn pipeline_graph(policy: ApprovalPolicy, stage_timeout: Duration) -> Result<CompiledGraph> {
    let approve_router = move |state: &FlowState| {
        let attempts = u32::try_from(state.completions(Stage::Approve)).unwrap_or(u32::MAX);
        policy
            .next_stage(&state.data, attempts)
            .map(|stage| stage.as_str().to_string())
    };

    // research + (process, approve) per attempt + optimize
    let max_visits = 2 * (policy.max_retries as usize + 1) + 2;

    StateGraph::new()
        .add_node(Stage::Research.as_str(), Stage::Research)
        .add_node(Stage::Process.as_str(), Stage::Process)
        .add_node(Stage::Approve.as_str(), Stage::Approve)
        .add_node(Stage::Optimize.as_str(), Stage::Optimize)
        .add_edge(Stage::Research.as_str(), Stage::Process.as_str())
        .add_edge(Stage::Process.as_str(), Stage::Approve.as_str())
        .add_conditional_edges(
            Stage::Approve.as_str(),
            approve_router,
            [
                (Stage::Optimize.as_str(), Stage::Optimize.as_str()),
                (Stage::Process.as_str(), Stage::Process.as_str()),
            ],
        )
        .set_entry_point(Stage::Research.as_str())
        .set_finish_point(Stage::Optimize.as_str())
        .recursion_limit(max_visits.max(DEFAULT_RECURSION_LIMIT))
        .stage_timeout(stage_timeout)
        .compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgentRegistry;
    use serde_json::json;

    #[test]
    fn test_pipeline_graph_compiles() {
        let graph = pipeline_graph(ApprovalPolicy::default(), DEFAULT_STAGE_TIMEOUT).unwrap();
        assert_eq!(graph.entry_point(), "research");
        assert_eq!(graph.finish_point(), "optimize");
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_compile_reports_problems() {
        let err = StateGraph::new()
            .add_node("research", Stage::Research)
            .add_edge("research", "missing")
            .set_entry_point("research")
            .compile()
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("no finish point"));
        assert!(message.contains("unknown node 'missing'"));
    }

    #[test]
    fn test_compile_rejects_second_outgoing_rule() {
        let err = StateGraph::new()
            .add_node("a", Stage::Research)
            .add_node("b", Stage::Process)
            .add_edge("a", "b")
            .add_edge("a", "a")
            .set_entry_point("a")
            .set_finish_point("b")
            .compile()
            .unwrap_err();
        assert!(err.to_string().contains("more than one outgoing rule"));
    }

    #[test]
    fn test_compile_rejects_dead_end() {
        let err = StateGraph::new()
            .add_node("a", Stage::Research)
            .add_node("b", Stage::Process)
            .set_entry_point("a")
            .set_finish_point("b")
            .compile()
            .unwrap_err();
        assert!(err.to_string().contains("node 'a' has no outgoing edge"));
    }

    #[tokio::test]
    async fn test_arun_runs_pipeline() {
        let graph = pipeline_graph(ApprovalPolicy::default(), DEFAULT_STAGE_TIMEOUT).unwrap();
        let mut agents = AgentRegistry::new().new_run();
        let input = Payload::new().with("query", json!("trends"));

        let state = graph
            .arun(FlowState::new("wf-graph", input), &mut agents)
            .await
            .unwrap();

        assert_eq!(state.workflow_id, "wf-graph");
        assert_eq!(state.current_step, "optimize");
        assert_eq!(
            state.steps(),
            ["research", "process", "approve", "optimize"]
        );
        let keys: Vec<_> = state.data.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["approval", "optimization", "processed_data", "research_results"]
        );
    }

    #[tokio::test]
    async fn test_recursion_limit_stops_cycles() {
        let graph = StateGraph::new()
            .add_node("a", Stage::Research)
            .add_node("b", Stage::Process)
            .add_node("end", Stage::Optimize)
            .add_edge("a", "b")
            .add_edge("b", "a")
            .set_entry_point("a")
            .set_finish_point("end")
            .recursion_limit(5)
            .compile();
        // "end" is unreachable but the graph is still structurally valid
        let graph = graph.unwrap();
        let mut agents = AgentRegistry::new().new_run();

        let err = graph
            .arun(FlowState::new("wf-loop", Payload::new()), &mut agents)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Recursion limit of 5"));
        assert_eq!(
            agents.get(Stage::Research).unwrap().call_history().len(),
            3
        );
    }

    struct SyncOnlyExecutor;

    #[async_trait]
    impl GraphExecutor for SyncOnlyExecutor {
        fn name(&self) -> &'static str {
            "sync_only"
        }
    }

    #[tokio::test]
    async fn test_default_arun_is_unsupported() {
        let mut agents = AgentRegistry::new().new_run();
        let err = SyncOnlyExecutor
            .arun(FlowState::new("wf", Payload::new()), &mut agents)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedExecutor(_)));
        assert!(err.to_string().contains("sync_only"));
    }
}
