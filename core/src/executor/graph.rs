use std::collections::{HashMap, HashSet};

use crate::error::ExecutorError;
use crate::executor::types::TaskLike;

/// Frozen task dependency graph (DAG) used for one run.
#[derive(Debug, Clone)]
pub struct TaskGraph<T: TaskLike> {
    /// Task nodes: task_id -> Task
    pub nodes: HashMap<String, T>,

    /// Dependency edges: task_id -> list of dependencies
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task_id -> list of tasks that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Original insertion order (for stable sorting)
    insertion_order: Vec<String>,
}

impl<T: TaskLike> TaskGraph<T> {
    /// Construct task graph from task list
    pub fn from_tasks(tasks: &[T]) -> Result<Self, ExecutorError> {
        let mut nodes = HashMap::new();
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut insertion_order = Vec::new();

        for task in tasks {
            if nodes.contains_key(task.id()) {
                return Err(ExecutorError::DuplicateTaskId(task.id().to_string()));
            }

            let task_id = task.id().to_string();
            let dependencies = task.dependencies().to_vec();

            nodes.insert(task_id.clone(), task.clone());
            edges.insert(task_id.clone(), dependencies.clone());
            insertion_order.push(task_id.clone());

            for dep in dependencies {
                reverse_edges.entry(dep).or_default().push(task_id.clone());
            }
        }

        Ok(Self {
            nodes,
            edges,
            reverse_edges,
            insertion_order,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insertion_order(&self) -> &[String] {
        &self.insertion_order
    }

    pub fn dependencies_of(&self, task_id: &str) -> &[String] {
        self.edges.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents_of(&self, task_id: &str) -> &[String] {
        self.reverse_edges
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Validate dependency relationships
    pub fn validate(&self) -> Result<(), ExecutorError> {
        for task_id in &self.insertion_order {
            for dep in self.dependencies_of(task_id) {
                if !self.nodes.contains_key(dep) {
                    return Err(ExecutorError::DependencyNotFound {
                        task_id: task_id.clone(),
                        missing_dep: dep.clone(),
                    });
                }
            }
        }

        if let Some(cycle) = self.detect_cycle() {
            return Err(ExecutorError::CircularDependency(cycle));
        }

        Ok(())
    }

    /// Topological sort using Kahn's algorithm
    ///
    /// Returns execution stages where tasks in the same stage have no
    /// dependency path between them. Used for display; the scheduler itself
    /// releases a task as soon as its own dependencies are terminal.
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    pub fn topological_sort(&self) -> Result<Vec<Vec<String>>, ExecutorError> {
        let position: HashMap<&str, usize> = self
            .insertion_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let by_insertion = |id: &String| position.get(id.as_str()).copied().unwrap_or(usize::MAX);

        // edges[A] = [B, C] means A depends on B and C, so A's in-degree = 2
        let mut in_degree: HashMap<&str, usize> = self
            .edges
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();

        let mut stages: Vec<Vec<String>> = Vec::new();
        let mut current_stage: Vec<String> = self
            .insertion_order
            .iter()
            .filter(|id| in_degree.get(id.as_str()) == Some(&0))
            .cloned()
            .collect();

        let mut processed = 0;

        while !current_stage.is_empty() {
            processed += current_stage.len();

            let mut next_stage = Vec::new();
            for task_id in &current_stage {
                for dependent in self.dependents_of(task_id) {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            next_stage.push(dependent.clone());
                        }
                    }
                }
            }

            next_stage.sort_by_key(by_insertion);
            stages.push(std::mem::replace(&mut current_stage, next_stage));
        }

        if processed != self.nodes.len() {
            return Err(ExecutorError::CircularDependency(
                "Unable to complete topological sort (cycle detected)".to_string(),
            ));
        }

        Ok(stages)
    }

    /// Detect circular dependencies using DFS
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task_id in &self.insertion_order {
            if !visited.contains(task_id) && self.dfs_cycle(task_id, &mut visited, &mut stack) {
                return Some(format_cycle_path(&stack));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        for dep in self.dependencies_of(node) {
            // dependency already on the current path closes a cycle
            if let Some(pos) = stack.iter().position(|x| x == dep) {
                stack.push(dep.clone());
                *stack = stack[pos..].to_vec();
                return true;
            }

            if !visited.contains(dep) && self.dfs_cycle(dep, visited, stack) {
                return true;
            }
        }

        stack.pop();
        false
    }
}

fn format_cycle_path(stack: &[String]) -> String {
    stack.join(" -> ")
}
