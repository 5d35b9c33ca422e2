use chrono::Local;
use canvasflow_core::executor::traits::{OutputRendererPlugin, RenderEvent};
use serde_json::{json, Value};

pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                workflow_id,
                total_tasks,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "workflow_id": workflow_id,
                    "total_tasks": total_tasks,
                }
            }),
            RenderEvent::Plan { run_id, stages } => {
                let total_tasks: usize = stages.iter().map(|s| s.len()).sum();
                json!({
                    "v": 1,
                    "event_type": "executor.plan",
                    "ts": ts,
                    "run_id": run_id,
                    "metadata": {
                        "stages": stages,
                        "total_tasks": total_tasks,
                    }
                })
            }
            RenderEvent::TaskStart {
                run_id,
                task_id,
                name,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "name": name,
                }
            }),
            RenderEvent::TaskComplete { run_id, entry } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": entry.task_id,
                "status": entry.status,
                "output": entry.output,
                "error": entry.error,
                "metadata": {
                    "duration_ms": entry.duration_ms,
                    "success": entry.is_success(),
                }
            }),
            RenderEvent::RunEnd { run_id, report } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "status": report.status,
                "metadata": {
                    "workflow_id": report.workflow_id,
                    "total_tasks": report.total_tasks,
                    "completed": report.completed,
                    "failed": report.failed,
                    "duration_ms": report.duration_ms,
                    "completion_order": report.completion_order,
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvasflow_core::executor::RunReport;
    use canvasflow_core::workflow::{ExecutionLogEntry, WorkflowStatus};
    use chrono::Utc;

    #[test]
    fn test_jsonl_renderer_event_type() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RunStart {
            run_id: "run".to_string(),
            workflow_id: "wf".to_string(),
            total_tasks: 2,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "run.start");
        assert_eq!(value["metadata"]["workflow_id"], "wf");
    }

    #[test]
    fn test_jsonl_renderer_task_complete() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            entry: ExecutionLogEntry::completed("task", json!({"words": 3}), Utc::now(), 12),
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "task.end");
        assert_eq!(value["status"], "COMPLETED");
        assert_eq!(value["output"]["words"], 3);
        assert_eq!(value["metadata"]["success"], true);
    }

    #[test]
    fn test_jsonl_renderer_run_end() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RunEnd {
            run_id: "run".to_string(),
            report: RunReport {
                run_id: "run".to_string(),
                workflow_id: "wf".to_string(),
                started_at: Utc::now(),
                status: WorkflowStatus::Failed,
                total_tasks: 3,
                completed: 2,
                failed: 1,
                duration_ms: 100,
                completion_order: vec!["a".into(), "b".into(), "c".into()],
                stages: Vec::new(),
            },
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["status"], "FAILED");
        assert_eq!(value["metadata"]["total_tasks"], 3);
    }
}
