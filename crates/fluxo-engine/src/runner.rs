//! Runs workflows through the engine and keeps their records up to date

use chrono::Utc;
use fluxo_core::Payload;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::engine::FlowEngine;
use crate::envelope::WorkflowEnvelope;
use crate::error::StoreResult;
use crate::store::{ExecutionRecord, RecordStatus, WorkflowRecord, WorkflowStore};

/// Pairs a [`FlowEngine`] with a [`WorkflowStore`]
#[derive(Clone)]
pub struct WorkflowRunner {
    engine: Arc<FlowEngine>,
    store: Arc<dyn WorkflowStore>,
}

impl WorkflowRunner {
    pub fn new(engine: Arc<FlowEngine>, store: Arc<dyn WorkflowStore>) -> Self {
        Self { engine, store }
    }

    pub fn engine(&self) -> &Arc<FlowEngine> {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    /// Create a running record, execute the workflow, then store the outcome
    ///
    /// A failed workflow is still `Ok`: its envelope and record carry the
    /// error. Only store failures are returned as errors.
    #[instrument(skip(self, description, input))]
    pub async fn run(
        &self,
        workflow_id: &str,
        name: &str,
        description: Option<&str>,
        input: Payload,
    ) -> StoreResult<WorkflowEnvelope> {
        let mut record = WorkflowRecord::new(workflow_id, name).with_status(RecordStatus::Running);
        record.description = description.map(str::to_string);
        self.store.create(record.clone()).await?;

        let started_at = Utc::now();
        let clock = Instant::now();
        let envelope = self.engine.execute_workflow(workflow_id, input).await;
        let execution_time_secs = clock.elapsed().as_secs_f64();

        let finished_at = Utc::now();
        record.status = envelope.status.into();
        record.result = envelope
            .result
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        record.error.clone_from(&envelope.error);
        record.updated_at = finished_at;
        record.completed_at = Some(finished_at);
        self.store.update(record).await?;

        self.store
            .record_execution(ExecutionRecord {
                workflow_id: workflow_id.to_string(),
                status: envelope.status,
                execution_time_secs,
                started_at,
            })
            .await?;

        info!(
            workflow_id,
            status = %envelope.status,
            execution_time_secs,
            "Workflow run recorded"
        );
        Ok(envelope)
    }
}
