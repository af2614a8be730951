//! JSON object payloads exchanged between pipeline stages
//!
//! A `Payload` is the mapping every agent consumes and produces. It wraps a
//! `serde_json` object and offers typed accessors for the well-known fields
//! the pipeline stages read from each other.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known payload keys shared by agents and the engine
pub mod keys {
    /// Research question or topic
    pub const QUERY: &str = "query";
    /// Free-form context for the research
    pub const CONTEXT: &str = "context";
    /// Caller-supplied constraints, forwarded as processing parameters
    pub const CONSTRAINTS: &str = "constraints";
    /// Processing task description
    pub const TASK: &str = "task";
    /// Researcher output handed to the processor
    pub const RESEARCH_FINDINGS: &str = "research_findings";
    /// Processing parameters
    pub const PARAMETERS: &str = "parameters";
    /// Approver feedback handed back to the processor on a retry
    pub const FEEDBACK: &str = "feedback";
    /// Processor output handed to the approver
    pub const RESULT: &str = "result";
    /// Approval criteria
    pub const CRITERIA: &str = "criteria";
    /// Approval verdict
    pub const APPROVED: &str = "approved";
    /// Prior stage outputs handed to the optimizer
    pub const WORKFLOW_RESULTS: &str = "workflow_results";
    /// Run-level metrics handed to the optimizer
    pub const PERFORMANCE_METRICS: &str = "performance_metrics";
}

/// A JSON object passed into and returned from agents
///
/// # Example
///
/// ```
/// use fluxo_core::Payload;
/// use serde_json::json;
///
/// let mut payload = Payload::new();
/// payload.insert("query", json!("trends"));
///
/// assert_eq!(payload.get_str("query"), Some("trends"));
/// assert_eq!(payload.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    data: Map<String, Value>,
}

impl Payload {
    /// Create a new empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a payload from an arbitrary JSON value
    ///
    /// Fails unless the value is a JSON object.
    pub fn from_value(value: Value) -> crate::Result<Self> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(crate::Error::ProcessingFailed(format!(
                "Expected a JSON object payload, got: {other}"
            ))),
        }
    }

    /// Serialize any value into a payload
    pub fn from_serializable<T: Serialize>(value: &T) -> crate::Result<Self> {
        Self::from_value(serde_json::to_value(value)?)
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value into the payload
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the payload
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Get a string value from the payload
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Get a value, or JSON `null` when absent
    pub fn get_or_null(&self, key: &str) -> Value {
        self.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Insert a typed value into the payload
    ///
    /// Serializes the value to JSON before storing.
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value)?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value from the payload
    ///
    /// Deserializes the JSON value into the specified type.
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    /// Check if a key exists in the payload
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value from the payload
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over the keys in insertion-independent (sorted) order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Merge another payload into this one (other values override)
    pub fn merge(&mut self, other: Payload) {
        self.data.extend(other.data);
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Convert into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

impl TryFrom<Value> for Payload {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        Self::from_value(value)
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        payload.into_value()
    }
}

/// JSON truthiness: `true`, non-zero numbers, non-empty strings, arrays and objects
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
