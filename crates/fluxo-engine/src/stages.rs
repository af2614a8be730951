//! Stage input wiring and timed stage execution
//!
//! Both execution strategies derive every stage's input the same way, from
//! the caller input and the outputs accumulated so far.

use fluxo_core::{Error, Payload, Result, Stage, is_truthy, keys};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::registry::AgentSet;

/// Task handed to the processor
pub const PROCESS_TASK: &str = "Process research findings";

/// Minimum quality the approver is asked to enforce
pub const QUALITY_THRESHOLD: f64 = 0.8;

/// Build the input for `stage` from the caller input and accumulated data
pub fn stage_input(stage: Stage, input: &Payload, data: &Payload) -> Payload {
    match stage {
        Stage::Research => input.clone(),
        Stage::Process => {
            let parameters = input
                .get(keys::CONSTRAINTS)
                .cloned()
                .unwrap_or_else(|| json!({}));
            let mut process_input = Payload::new()
                .with(keys::TASK, json!(PROCESS_TASK))
                .with(
                    keys::RESEARCH_FINDINGS,
                    data.get_or_null(Stage::Research.result_key()),
                )
                .with(keys::PARAMETERS, parameters);

            if let Some(approval) = data
                .get(Stage::Approve.result_key())
                .filter(|approval| !is_approved(approval))
            {
                process_input.insert(
                    keys::FEEDBACK,
                    approval.get("feedback").cloned().unwrap_or(Value::Null),
                );
            }
            process_input
        }
        Stage::Approve => Payload::new()
            .with(keys::RESULT, data.get_or_null(Stage::Process.result_key()))
            .with(
                keys::CRITERIA,
                json!({"quality_threshold": QUALITY_THRESHOLD}),
            ),
        Stage::Optimize => {
            let execution_time = data
                .get(Stage::Process.result_key())
                .and_then(|processed| processed.pointer("/metrics/processing_time"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);

            Payload::new()
                .with(
                    keys::WORKFLOW_RESULTS,
                    json!({
                        "research": data.get_or_null(Stage::Research.result_key()),
                        "process": data.get_or_null(Stage::Process.result_key()),
                        "approval": data.get_or_null(Stage::Approve.result_key()),
                    }),
                )
                .with(
                    keys::PERFORMANCE_METRICS,
                    json!({"execution_time": execution_time, "success_rate": 1.0}),
                )
        }
    }
}

/// Whether an approver output grants approval
pub fn is_approved(approval: &Value) -> bool {
    approval.get(keys::APPROVED).is_some_and(is_truthy)
}

/// Run one stage through its agent handle, bounded by `stage_timeout`
pub async fn run_stage(
    agents: &mut AgentSet,
    stage: Stage,
    input: Payload,
    stage_timeout: Duration,
) -> Result<Payload> {
    let handle = agents
        .get_mut(stage)
        .ok_or_else(|| Error::InitializationFailed(format!("No agent bound to stage '{stage}'")))?;

    debug!(stage = %stage, agent = handle.name(), "Running stage");

    let output = timeout(stage_timeout, handle.process(input))
        .await
        .map_err(|_| Error::StageTimeout {
            stage: stage.to_string(),
            timeout: stage_timeout,
        })??;

    info!(stage = %stage, "Stage completed");
    Ok(output)
}
