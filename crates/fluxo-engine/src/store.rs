//! Workflow records and their storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::envelope::WorkflowStatus;
use crate::error::{StoreError, StoreResult};

/// Lifecycle status of a stored workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Error,
}

impl From<WorkflowStatus> for RecordStatus {
    fn from(status: WorkflowStatus) -> Self {
        match status {
            WorkflowStatus::Completed => RecordStatus::Completed,
            WorkflowStatus::Error => RecordStatus::Error,
        }
    }
}

/// A workflow as kept by a [`WorkflowStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: RecordStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowRecord {
    /// A pending record created now
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            status: RecordStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the workflow has reached a final status
    pub fn is_finished(&self) -> bool {
        matches!(self.status, RecordStatus::Completed | RecordStatus::Error)
    }
}

/// One execution of a stored workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub workflow_id: String,
    pub status: WorkflowStatus,
    pub execution_time_secs: f64,
    pub started_at: DateTime<Utc>,
}

/// Persistence for workflow records and their executions
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Store a new record; fails if the id is taken
    async fn create(&self, record: WorkflowRecord) -> StoreResult<()>;

    /// Get a record by id
    async fn get(&self, id: &str) -> StoreResult<WorkflowRecord>;

    /// All records, oldest first
    async fn list(&self) -> StoreResult<Vec<WorkflowRecord>>;

    /// Replace an existing record
    async fn update(&self, record: WorkflowRecord) -> StoreResult<()>;

    /// Remove a record and its executions
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Append an execution to an existing record
    async fn record_execution(&self, execution: ExecutionRecord) -> StoreResult<()>;

    /// Executions of a workflow in the order they were recorded
    async fn executions(&self, id: &str) -> StoreResult<Vec<ExecutionRecord>>;
}

#[derive(Default)]
struct StoreInner {
    records: HashMap<String, WorkflowRecord>,
    executions: HashMap<String, Vec<ExecutionRecord>>,
}

/// Process-local store, cheap to clone and share
#[derive(Clone, Default)]
pub struct InMemoryWorkflowStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn create(&self, record: WorkflowRecord) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.records.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id));
        }
        inner.records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<WorkflowRecord> {
        self.inner
            .read()
            .await
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self) -> StoreResult<Vec<WorkflowRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<_> = inner.records.values().cloned().collect();
        records.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(records)
    }

    async fn update(&self, record: WorkflowRecord) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        match inner.records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id)),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.executions.remove(id);
        inner
            .records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn record_execution(&self, execution: ExecutionRecord) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.records.contains_key(&execution.workflow_id) {
            return Err(StoreError::NotFound(execution.workflow_id));
        }
        inner
            .executions
            .entry(execution.workflow_id.clone())
            .or_default()
            .push(execution);
        Ok(())
    }

    async fn executions(&self, id: &str) -> StoreResult<Vec<ExecutionRecord>> {
        let inner = self.inner.read().await;
        if !inner.records.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(inner.executions.get(id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryWorkflowStore::new();
        store
            .create(WorkflowRecord::new("wf-1", "Feedback").with_description("trends"))
            .await
            .unwrap();

        let record = store.get("wf-1").await.unwrap();
        assert_eq!(record.name, "Feedback");
        assert_eq!(record.description.as_deref(), Some("trends"));
        assert_eq!(record.status, RecordStatus::Pending);
        assert!(!record.is_finished());
    }

    #[tokio::test]
    async fn test_duplicate_and_missing() {
        let store = InMemoryWorkflowStore::new();
        store.create(WorkflowRecord::new("wf-1", "a")).await.unwrap();

        let err = store
            .create(WorkflowRecord::new("wf-1", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(id) if id == "wf-1"));

        assert!(matches!(store.get("nope").await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update(WorkflowRecord::new("nope", "x")).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete("nope").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_creation_time() {
        let store = InMemoryWorkflowStore::new();
        let mut older = WorkflowRecord::new("wf-b", "older");
        older.created_at -= Duration::seconds(10);

        store.create(WorkflowRecord::new("wf-a", "newer")).await.unwrap();
        store.create(older).await.unwrap();

        let ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, ["wf-b", "wf-a"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryWorkflowStore::new();
        store.create(WorkflowRecord::new("wf-1", "a")).await.unwrap();

        let record = store
            .get("wf-1")
            .await
            .unwrap()
            .with_status(RecordStatus::Completed);
        store.update(record).await.unwrap();
        assert!(store.get("wf-1").await.unwrap().is_finished());

        store.delete("wf-1").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_executions_follow_record() {
        let store = InMemoryWorkflowStore::new();
        let execution = ExecutionRecord {
            workflow_id: "wf-1".to_string(),
            status: WorkflowStatus::Completed,
            execution_time_secs: 0.5,
            started_at: Utc::now(),
        };

        assert!(store.record_execution(execution.clone()).await.is_err());

        store.create(WorkflowRecord::new("wf-1", "a")).await.unwrap();
        store.record_execution(execution.clone()).await.unwrap();
        store.record_execution(execution).await.unwrap();
        assert_eq!(store.executions("wf-1").await.unwrap().len(), 2);

        store.delete("wf-1").await.unwrap();
        assert!(store.executions("wf-1").await.is_err());
    }

    #[test]
    fn test_status_serialization() {
        let value = serde_json::to_value(RecordStatus::Running).unwrap();
        assert_eq!(value, serde_json::json!("running"));
        assert_eq!(
            RecordStatus::from(WorkflowStatus::Error),
            RecordStatus::Error
        );
    }
}
