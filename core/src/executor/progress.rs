use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Terminal progress bars for a workflow run.
///
/// One overall bar plus a spinner per launched task. A disabled monitor is a
/// no-op, which is what the JSONL renderer and tests use.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: HashMap<String, (ProgressBar, String)>,
    enabled: bool,
}

impl ProgressMonitor {
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: HashMap::new(),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));

        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        overall.set_style(style);
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            task_bars: HashMap::new(),
            enabled: true,
        }
    }

    /// Add a spinner for a launched task, labelled with its display name.
    pub fn add_task(&mut self, task_id: &str, label: &str) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        let style = ProgressStyle::default_spinner()
            .template("  {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        bar.set_style(style);
        bar.set_message(format!("⏳ {label}"));
        bar.enable_steady_tick(Duration::from_millis(100));

        self.task_bars
            .insert(task_id.to_string(), (bar, label.to_string()));
    }

    /// Mark a task terminal. Tasks skipped without launching only advance the
    /// overall bar.
    pub fn complete_task(&mut self, task_id: &str, success: bool, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        if let Some((bar, label)) = self.task_bars.remove(task_id) {
            let icon = if success { "✅" } else { "❌" };
            bar.finish_with_message(format!("{icon} {label} ({duration_ms}ms)"));
        }

        self.overall.inc(1);
    }

    pub fn set_message(&self, msg: &str) {
        if self.enabled {
            self.overall.set_message(msg.to_string());
        }
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }

        let msg = if success {
            "✅ All tasks completed"
        } else {
            "❌ Workflow failed"
        };

        self.overall.finish_with_message(msg.to_string());
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, (bar, _)) in self.task_bars.drain() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_monitor_disabled() {
        let mut monitor = ProgressMonitor::new(3, false);

        monitor.add_task("t1", "Input");
        monitor.complete_task("t1", true, 100);
        monitor.set_message("test");
        monitor.finish(true);
        assert!(monitor.task_bars.is_empty());
    }

    #[test]
    fn test_progress_monitor_enabled() {
        let mut monitor = ProgressMonitor::new(3, true);

        monitor.add_task("t1", "Input");
        monitor.add_task("t2", "Input");
        assert_eq!(monitor.task_bars.len(), 2);

        monitor.complete_task("t1", true, 100);
        monitor.complete_task("t2", false, 200);
        monitor.complete_task("skipped", false, 0);

        assert!(monitor.task_bars.is_empty());
        assert_eq!(monitor.overall.position(), 3);
        monitor.finish(false);
    }
}
