use std::collections::{HashMap, HashSet};

use super::graph::TaskGraph;
use super::types::{FailurePolicy, TaskLike};

/// Per-run readiness bookkeeping.
///
/// A task becomes ready once every one of its dependencies has COMPLETED.
/// Tasks are released in graph insertion order so the launch order is stable
/// for a given graph. Pure and synchronous; the engine drives it.
#[derive(Debug)]
pub struct DependencyTracker {
    order: Vec<String>,
    dependents: HashMap<String, Vec<String>>,
    remaining: HashMap<String, usize>,
    pending: HashSet<String>,
    launched: HashSet<String>,
    finished: HashSet<String>,
    policy: FailurePolicy,
    halted: bool,
}

impl DependencyTracker {
    pub fn new<T: TaskLike>(graph: &TaskGraph<T>, policy: FailurePolicy) -> Self {
        let order = graph.insertion_order().to_vec();
        let dependents = order
            .iter()
            .map(|id| (id.clone(), graph.dependents_of(id).to_vec()))
            .collect();
        let remaining = order
            .iter()
            .map(|id| (id.clone(), graph.dependencies_of(id).len()))
            .collect();

        Self {
            pending: order.iter().cloned().collect(),
            order,
            dependents,
            remaining,
            launched: HashSet::new(),
            finished: HashSet::new(),
            policy,
            halted: false,
        }
    }

    /// Tasks whose dependencies have all completed and that have not been
    /// launched yet. Marks them launched. Empty once the run is halted.
    pub fn take_ready(&mut self) -> Vec<String> {
        if self.halted {
            return Vec::new();
        }

        let ready: Vec<String> = self
            .order
            .iter()
            .filter(|id| self.pending.contains(*id))
            .filter(|id| self.remaining.get(*id) == Some(&0))
            .cloned()
            .collect();

        for id in &ready {
            self.pending.remove(id);
            self.launched.insert(id.clone());
        }

        ready
    }

    /// Record the terminal outcome of a launched task.
    ///
    /// On failure under `SkipDependents`, every pending transitive dependent is
    /// withdrawn and returned with a reason, in insertion order. Under
    /// `FailFast` the tracker halts and nothing is returned here; the engine
    /// collects the leftovers via `drain_unfinished` once in-flight work ends.
    pub fn complete(&mut self, task_id: &str, success: bool) -> Vec<(String, String)> {
        if !self.launched.remove(task_id) {
            return Vec::new();
        }
        self.finished.insert(task_id.to_string());

        if success {
            for dependent in self.dependents.get(task_id).into_iter().flatten() {
                if let Some(count) = self.remaining.get_mut(dependent) {
                    *count = count.saturating_sub(1);
                }
            }
            return Vec::new();
        }

        match self.policy {
            FailurePolicy::FailFast => {
                self.halted = true;
                Vec::new()
            }
            FailurePolicy::SkipDependents => self.skip_dependents_of(task_id),
        }
    }

    fn skip_dependents_of(&mut self, failed: &str) -> Vec<(String, String)> {
        let mut doomed = HashSet::new();
        let mut stack = vec![failed.to_string()];
        while let Some(current) = stack.pop() {
            for dependent in self.dependents.get(&current).into_iter().flatten() {
                if self.pending.contains(dependent) && doomed.insert(dependent.clone()) {
                    stack.push(dependent.clone());
                }
            }
        }

        let skipped: Vec<(String, String)> = self
            .order
            .iter()
            .filter(|id| doomed.contains(*id))
            .map(|id| (id.clone(), format!("skipped: upstream task {failed} failed")))
            .collect();

        for (id, _) in &skipped {
            self.pending.remove(id);
            self.finished.insert(id.clone());
        }

        skipped
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// True when nothing is in flight and nothing more can be released.
    pub fn is_finished(&self) -> bool {
        if !self.launched.is_empty() {
            return false;
        }
        if self.pending.is_empty() || self.halted {
            return true;
        }
        // A pending task with an uncompleted dependency that is not in flight
        // can never become ready.
        !self
            .pending
            .iter()
            .any(|id| self.remaining.get(id) == Some(&0))
    }

    /// Withdraw every task that never started, in insertion order.
    pub fn drain_unfinished(&mut self) -> Vec<String> {
        let leftovers: Vec<String> = self
            .order
            .iter()
            .filter(|id| self.pending.contains(*id))
            .cloned()
            .collect();
        for id in &leftovers {
            self.pending.remove(id);
            self.finished.insert(id.clone());
        }
        leftovers
    }
}
