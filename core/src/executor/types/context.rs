use std::collections::HashMap;

use serde_json::Value;

/// Shared key-value space through which tasks pass outputs downstream.
///
/// Each task receives a snapshot taken when it was launched. The snapshot
/// always contains the outputs of all of the task's dependencies.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    run_id: String,
    task_id: String,
    values: HashMap<String, Value>,
    /// Target keys of the task's direct dependencies, in declaration order.
    upstream_keys: Vec<String>,
}

impl ExecutionContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Default::default()
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Outputs of the task's direct dependencies that are present in the context.
    pub fn upstream(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.upstream_keys
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.as_str(), v)))
    }

    /// Value of `key` if given, else the first upstream output.
    pub fn resolve(&self, key: Option<&str>) -> Option<&Value> {
        match key {
            Some(k) => self.get(k),
            None => self.upstream().next().map(|(_, v)| v),
        }
    }

    /// Snapshot handed to one task.
    pub fn for_task(&self, task_id: &str, upstream_keys: Vec<String>) -> Self {
        Self {
            run_id: self.run_id.clone(),
            task_id: task_id.to_string(),
            values: self.values.clone(),
            upstream_keys,
        }
    }
}
