use crate::executor::types::RunReport;
use crate::workflow::ExecutionLogEntry;

/// Output renderer plugin (controls how run progress is shown)
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// Run lifecycle events emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        workflow_id: String,
        total_tasks: usize,
    },
    Plan {
        run_id: String,
        stages: Vec<Vec<String>>,
    },
    TaskStart {
        run_id: String,
        task_id: String,
        name: String,
    },
    TaskComplete {
        run_id: String,
        entry: ExecutionLogEntry,
    },
    RunEnd {
        run_id: String,
        report: RunReport,
    },
}
