//! Subcommand implementations

use anyhow::{Context, Result, bail};
use clap::Args;
use fluxo_core::{AgentHandle, Payload, Stage, keys};
use fluxo_engine::{
    AgentRegistry, FlowEngine, InMemoryWorkflowStore, WorkflowEnvelope, WorkflowRunner,
};
use fluxo_utils::AppConfig;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Workflow input as a JSON object (defaults to the customer-feedback sample)
    #[arg(short, long)]
    input: Option<String>,

    /// Workflow id (a random UUID when omitted)
    #[arg(long)]
    workflow_id: Option<String>,

    /// Workflow name stored with the record
    #[arg(long, default_value = "Customer feedback analysis")]
    name: String,

    /// Use the graph strategy with direct fallback
    #[arg(long, conflicts_with = "mock")]
    graph: bool,

    /// Use the direct strategy
    #[arg(long)]
    mock: bool,

    /// Feed the result into a fresh optimizer and print its suggestions
    #[arg(long)]
    reflect: bool,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Number of workflows to run
    #[arg(short, long, default_value_t = 3)]
    count: usize,

    /// Use the graph strategy with direct fallback
    #[arg(long, conflicts_with = "mock")]
    graph: bool,

    /// Use the direct strategy
    #[arg(long)]
    mock: bool,
}

fn sample_input() -> Value {
    json!({
        "query": "Analyze customer feedback trends",
        "context": "E-commerce customer reviews dataset",
        "constraints": {
            "time_period": "last_month",
            "min_confidence": 0.8
        }
    })
}

fn strategy_override(graph: bool, mock: bool) -> Option<bool> {
    match (graph, mock) {
        (true, _) => Some(false),
        (_, true) => Some(true),
        _ => None,
    }
}

fn build_engine(config: &AppConfig, use_mock: Option<bool>) -> Result<FlowEngine> {
    let mut builder = FlowEngine::builder().config(&config.workflow);
    if let Some(use_mock) = use_mock {
        builder = builder.use_mock(use_mock);
    }
    builder.build().context("Failed to build flow engine")
}

fn runner(engine: FlowEngine) -> WorkflowRunner {
    WorkflowRunner::new(Arc::new(engine), Arc::new(InMemoryWorkflowStore::new()))
}

pub async fn run(config: &AppConfig, args: RunArgs) -> Result<()> {
    let input = match &args.input {
        Some(raw) => {
            let value: Value = serde_json::from_str(raw).context("Input is not valid JSON")?;
            Payload::try_from(value).context("Input must be a JSON object")?
        }
        None => Payload::try_from(sample_input())?,
    };
    let workflow_id = args
        .workflow_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let engine = build_engine(config, strategy_override(args.graph, args.mock))?;
    info!(workflow_id = %workflow_id, strategy = engine.strategy_name(), "Running workflow");

    let runner = runner(engine);
    let envelope = runner
        .run(&workflow_id, &args.name, None, input)
        .await
        .context("Failed to record workflow run")?;

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    println!();
    print_history(&envelope);

    if args.reflect {
        reflect(&envelope).await?;
    }

    if !envelope.is_completed() {
        bail!(
            "Workflow {} failed: {}",
            envelope.workflow_id,
            envelope.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_history(envelope: &WorkflowEnvelope) {
    println!("Execution history ({}):", envelope.status);
    for entry in &envelope.history {
        println!("  {}  {}", entry.timestamp.to_rfc3339(), entry.step);
    }
}

/// Run a fresh optimizer over a finished workflow
async fn reflect(envelope: &WorkflowEnvelope) -> Result<()> {
    let success_rate = if envelope.is_completed() { 1.0 } else { 0.0 };
    let input = Payload::new()
        .with(keys::WORKFLOW_RESULTS, serde_json::to_value(envelope)?)
        .with(
            keys::PERFORMANCE_METRICS,
            json!({
                "execution_time": 0.0,
                "success_rate": success_rate,
                "steps": envelope.history.len(),
            }),
        );

    let mut optimizer = AgentHandle::new(fluxo_agents::default_agent(Stage::Optimize));
    let report = optimizer.process(input).await?;

    println!();
    println!("Self-reflection:");
    let optimizations = report
        .get("optimizations")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for item in optimizations {
        println!(
            "  - [{}] {} ({})",
            item["component"].as_str().unwrap_or("-"),
            item["suggestion"].as_str().unwrap_or("-"),
            item["expected_improvement"].as_str().unwrap_or("-"),
        );
    }
    if let Some(plan) = implementation_plan(&report) {
        println!("  Plan: {plan}");
    }
    Ok(())
}

/// The optimizer's implementation steps joined into one line
fn implementation_plan(report: &Payload) -> Option<String> {
    let steps: Vec<&str> = report
        .get("implementation_plan")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(Value::as_str)
        .collect();
    (!steps.is_empty()).then(|| steps.join("; "))
}

pub fn agents() -> Result<()> {
    for info in AgentRegistry::new().catalogue() {
        println!("{:<11} {:<11} {}", info.id, info.name, info.description);
        println!(
            "{:<11} capabilities: {}",
            "", info.capabilities.join(", ")
        );
    }
    Ok(())
}

pub fn agent(id: &str) -> Result<()> {
    let Some(config) = AgentRegistry::new().config(id) else {
        let known: Vec<_> = Stage::ALL.iter().map(|stage| stage.agent_id()).collect();
        bail!(
            "Unknown agent '{id}' (expected one of: {})",
            known.join(", ")
        );
    };
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub async fn batch(config: &AppConfig, args: BatchArgs) -> Result<()> {
    if args.count == 0 {
        bail!("--count must be at least 1");
    }

    let engine = build_engine(config, strategy_override(args.graph, args.mock))?;
    let runner = runner(engine);
    let input = Payload::try_from(sample_input())?;

    let ids: Vec<String> = (0..args.count)
        .map(|_| uuid::Uuid::new_v4().to_string())
        .collect();
    let runs = ids.iter().map(|id| {
        let name = format!("batch-{id}");
        let runner = runner.clone();
        let input = input.clone();
        async move { runner.run(id, &name, None, input).await }
    });
    let results = futures::future::join_all(runs).await;

    let mut failed = 0;
    for (id, result) in ids.iter().zip(results) {
        let envelope = result.with_context(|| format!("Failed to record workflow {id}"))?;
        if !envelope.is_completed() {
            failed += 1;
        }
        println!(
            "{id}  {}  {} steps",
            envelope.status, envelope.history.len()
        );
    }

    let stored = runner.store().list().await?;
    info!(runs = stored.len(), failed, "Batch finished");
    if failed > 0 {
        bail!("{failed} of {} workflows failed", args.count);
    }
    Ok(())
}
