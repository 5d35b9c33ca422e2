use canvasflow_core::executor::traits::{OutputRendererPlugin, RenderEvent};
use canvasflow_core::workflow::WorkflowStatus;

pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::RunStart {
                run_id,
                workflow_id,
                total_tasks,
            } => format!(
                "RUN START {} (workflow {}, tasks: {})",
                run_id, workflow_id, total_tasks
            ),
            RenderEvent::Plan { run_id, stages } => {
                let mut out = format!("PLAN {}:", run_id);
                for (idx, stage) in stages.iter().enumerate() {
                    out.push_str(&format!("\n  stage {}: {}", idx, stage.join(", ")));
                }
                out
            }
            RenderEvent::TaskStart {
                run_id,
                task_id,
                name,
            } => format!("TASK START {} ({}, task {})", run_id, name, task_id),
            RenderEvent::TaskComplete { run_id, entry } => {
                let status = match (entry.is_success(), self.ascii_only) {
                    (true, true) => "OK",
                    (true, false) => "SUCCESS",
                    (false, true) => "FAIL",
                    (false, false) => "FAILED",
                };
                let mut line = format!(
                    "TASK END {} (task {}, status {}, duration {}ms)",
                    run_id, entry.task_id, status, entry.duration_ms
                );
                if let Some(error) = &entry.error {
                    line.push_str(&format!(": {}", error));
                }
                line
            }
            RenderEvent::RunEnd { run_id, report } => {
                let status = match report.status {
                    WorkflowStatus::Completed => "COMPLETED",
                    WorkflowStatus::Failed => "FAILED",
                    WorkflowStatus::Running => "RUNNING",
                    WorkflowStatus::Idle => "IDLE",
                };
                format!(
                    "RUN END {} (status {}, completed {}, failed {}, duration {}ms)",
                    run_id, status, report.completed, report.failed, report.duration_ms
                )
            }
        }
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        println!("{}", self.format_event(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvasflow_core::workflow::ExecutionLogEntry;
    use chrono::Utc;

    #[test]
    fn test_text_renderer_task_complete() {
        let renderer = TextRendererPlugin::new(true);
        let event = RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            entry: ExecutionLogEntry::failed("task", "timed out after 5ms", Utc::now(), 5),
        };

        let line = renderer.format_event(&event);
        assert!(line.starts_with("TASK END run"));
        assert!(line.contains("status FAIL"));
        assert!(line.ends_with(": timed out after 5ms"));
    }

    #[test]
    fn test_text_renderer_plan() {
        let renderer = TextRendererPlugin::new(false);
        let event = RenderEvent::Plan {
            run_id: "run".to_string(),
            stages: vec![vec!["a".into(), "b".into()], vec!["c".into()]],
        };

        let out = renderer.format_event(&event);
        assert_eq!(out, "PLAN run:\n  stage 0: a, b\n  stage 1: c");
    }
}
