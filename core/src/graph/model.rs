use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{Point, Task, TaskConfig, TaskId, TaskPatch, TaskType};

/// Result of a connect request.
///
/// Rejections come from routine user interaction, so they are values rather
/// than errors; the graph is unchanged for every variant except `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    SelfLoop,
    Duplicate,
    WouldCycle,
    UnknownTask,
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected)
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ConnectOutcome::Connected => "connected",
            ConnectOutcome::SelfLoop => "a task cannot depend on itself",
            ConnectOutcome::Duplicate => "dependency already exists",
            ConnectOutcome::WouldCycle => "dependency would create a cycle",
            ConnectOutcome::UnknownTask => "unknown task",
        }
    }
}

/// Task collection with referential integrity and an acyclic dependency relation.
///
/// Insertion order is kept for default z-ordering only; it never affects
/// execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphModel {
    tasks: Vec<Task>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Create a task with a fresh id and the default config for `task_type`.
    ///
    /// `auto_connect_from` adds a single dependency on that task when it exists.
    pub fn add_task(
        &mut self,
        task_type: TaskType,
        position: Point,
        auto_connect_from: Option<&str>,
    ) -> Task {
        let id = Uuid::new_v4().simple().to_string();
        let target_key = format!("{}_{}", task_type.slug(), &id[..8]);
        let dependencies = auto_connect_from
            .filter(|from| self.contains(from))
            .map(|from| vec![from.to_string()])
            .unwrap_or_default();

        let task = Task {
            id,
            task_type,
            name: task_type.label().to_string(),
            config: TaskConfig::default_for(task_type, target_key),
            position,
            dependencies,
        };

        tracing::debug!(task_id = %task.id, task_type = %task_type, "task added");
        self.tasks.push(task.clone());
        task
    }

    /// Insert a fully built task (loading, tests, imports).
    ///
    /// Returns false when the id is taken. Dependencies that are unknown,
    /// repeated or self-referencing are dropped.
    pub fn insert(&mut self, mut task: Task) -> bool {
        if self.contains(&task.id) {
            return false;
        }

        let mut seen = HashSet::new();
        let own_id = task.id.clone();
        task.dependencies
            .retain(|dep| *dep != own_id && self.contains(dep) && seen.insert(dep.clone()));

        self.tasks.push(task);
        true
    }

    /// Remove a task and prune it from every other task's dependencies.
    /// Idempotent when the id is absent.
    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        let removed = self.tasks.remove(index);

        for task in &mut self.tasks {
            task.dependencies.retain(|dep| dep != id);
        }

        tracing::debug!(task_id = %id, "task removed");
        Some(removed)
    }

    /// Merge the given fields into the task. Changing the type keeps the config.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> bool {
        let Some(task) = self.get_mut(id) else {
            return false;
        };

        if let Some(name) = patch.name {
            task.name = name;
        }
        if let Some(task_type) = patch.task_type {
            task.task_type = task_type;
        }
        if let Some(config) = patch.config {
            task.config = config;
        }
        if let Some(position) = patch.position {
            task.position = position;
        }
        true
    }

    /// Make `target` depend on `source`.
    pub fn connect(&mut self, source: &str, target: &str) -> ConnectOutcome {
        if source == target {
            return ConnectOutcome::SelfLoop;
        }
        if !self.contains(source) || !self.contains(target) {
            return ConnectOutcome::UnknownTask;
        }
        if self.get(target).is_some_and(|t| t.depends_on(source)) {
            return ConnectOutcome::Duplicate;
        }
        // target -> source already exists as a path, so source -> target would close a loop
        if self.depends_transitively(source, target) {
            return ConnectOutcome::WouldCycle;
        }

        if let Some(task) = self.get_mut(target) {
            task.dependencies.push(source.to_string());
        }
        ConnectOutcome::Connected
    }

    /// Remove `source` from `target`'s dependencies. No-op when absent.
    pub fn disconnect(&mut self, source: &str, target: &str) -> bool {
        let Some(task) = self.get_mut(target) else {
            return false;
        };
        let before = task.dependencies.len();
        task.dependencies.retain(|dep| dep != source);
        before != task.dependencies.len()
    }

    /// Update only the position. Never persisted by itself.
    pub fn set_position(&mut self, id: &str, position: Point) -> bool {
        match self.get_mut(id) {
            Some(task) => {
                task.position = position;
                true
            }
            None => false,
        }
    }

    /// Tasks that list `id` as a direct dependency.
    pub fn dependents(&self, id: &str) -> Vec<&TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.depends_on(id))
            .map(|t| &t.id)
            .collect()
    }

    /// Whether `task` depends on `ancestor` through any chain of dependencies.
    pub fn depends_transitively(&self, task: &str, ancestor: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![task];

        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            for dep in &node.dependencies {
                if dep == ancestor {
                    return true;
                }
                if visited.insert(dep.as_str()) {
                    stack.push(dep.as_str());
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chain() -> (GraphModel, String, String, String) {
        let mut graph = GraphModel::new();
        let a = graph.add_task(TaskType::Input, Point::ORIGIN, None).id;
        let b = graph
            .add_task(TaskType::Generation, Point::new(250.0, 0.0), Some(&a))
            .id;
        let c = graph
            .add_task(TaskType::Analysis, Point::new(500.0, 0.0), Some(&b))
            .id;
        (graph, a, b, c)
    }

    #[test]
    fn test_add_task_defaults() {
        let mut graph = GraphModel::new();
        let task = graph.add_task(TaskType::Generation, Point::new(10.0, 20.0), None);

        assert_eq!(task.name, "Generation");
        assert_eq!(task.position, Point::new(10.0, 20.0));
        assert!(task.dependencies.is_empty());
        assert!(task.config.target_key.starts_with("generation_"));
        assert_eq!(task.config.settings.task_type(), TaskType::Generation);
    }

    #[test]
    fn test_add_task_auto_connect_ignores_unknown_source() {
        let mut graph = GraphModel::new();
        let task = graph.add_task(TaskType::Analysis, Point::ORIGIN, Some("missing"));
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn test_connect_rejections() {
        let (mut graph, a, b, c) = chain();

        assert_eq!(graph.connect(&a, &a), ConnectOutcome::SelfLoop);
        assert_eq!(graph.connect(&a, &b), ConnectOutcome::Duplicate);
        assert_eq!(graph.connect(&c, &a), ConnectOutcome::WouldCycle);
        assert_eq!(graph.connect(&b, &a), ConnectOutcome::WouldCycle);
        assert_eq!(graph.connect(&a, "nope"), ConnectOutcome::UnknownTask);

        assert_eq!(graph.get(&a).unwrap().dependencies, Vec::<String>::new());
    }

    #[test]
    fn test_connect_twice_keeps_single_dependency() {
        let mut graph = GraphModel::new();
        let a = graph.add_task(TaskType::Input, Point::ORIGIN, None).id;
        let b = graph.add_task(TaskType::Generation, Point::ORIGIN, None).id;

        assert!(graph.connect(&a, &b).is_connected());
        assert!(!graph.connect(&a, &b).is_connected());
        assert_eq!(graph.get(&b).unwrap().dependencies, vec![a]);
    }

    #[test]
    fn test_opposite_edges_cannot_both_succeed() {
        let mut graph = GraphModel::new();
        let a = graph.add_task(TaskType::Input, Point::ORIGIN, None).id;
        let b = graph.add_task(TaskType::Input, Point::ORIGIN, None).id;

        assert!(graph.connect(&a, &b).is_connected());
        assert_eq!(graph.connect(&b, &a), ConnectOutcome::WouldCycle);
    }

    #[test]
    fn test_shortcut_edge_is_allowed() {
        let (mut graph, a, _b, c) = chain();
        assert!(graph.connect(&a, &c).is_connected());
    }

    #[test]
    fn test_remove_task_prunes_dependencies() {
        let (mut graph, a, b, c) = chain();
        graph.connect(&a, &c);

        let removed = graph.remove_task(&a).unwrap();
        assert_eq!(removed.id, a);
        assert!(graph.tasks().iter().all(|t| !t.depends_on(&a)));
        assert_eq!(graph.get(&c).unwrap().dependencies, vec![b]);

        assert!(graph.remove_task(&a).is_none());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let (mut graph, a, b, c) = chain();
        let before = graph.clone();

        assert!(!graph.disconnect(&a, &c));
        assert_eq!(graph, before);

        assert!(graph.disconnect(&a, &b));
        assert!(!graph.disconnect(&a, &b));
        assert!(graph.get(&b).unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_update_task_type_keeps_config() {
        let (mut graph, a, _, _) = chain();
        let config = graph.get(&a).unwrap().config.clone();

        assert!(graph.update_task(
            &a,
            TaskPatch {
                name: Some("Seed".to_string()),
                task_type: Some(TaskType::Analysis),
                ..Default::default()
            }
        ));

        let task = graph.get(&a).unwrap();
        assert_eq!(task.name, "Seed");
        assert_eq!(task.task_type, TaskType::Analysis);
        assert_eq!(task.config, config);
        assert!(!graph.update_task("missing", TaskPatch::default()));
    }

    #[test]
    fn test_insert_sanitizes_dependencies() {
        let mut graph = GraphModel::new();
        let a = graph.add_task(TaskType::Input, Point::ORIGIN, None);

        let mut b = a.clone();
        b.id = "b".to_string();
        b.dependencies = vec![a.id.clone(), a.id.clone(), "b".to_string(), "ghost".to_string()];

        assert!(graph.insert(b.clone()));
        assert!(!graph.insert(b));
        assert_eq!(graph.get("b").unwrap().dependencies, vec![a.id]);
    }

    #[test]
    fn test_dependents() {
        let (graph, a, b, _) = chain();
        assert_eq!(graph.dependents(&a), vec![&b]);
    }
}
