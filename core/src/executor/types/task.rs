use crate::graph::Task;

/// Common task interface for executor graph handling.
pub trait TaskLike: Clone + Send + Sync {
    fn id(&self) -> &str;
    fn dependencies(&self) -> &[String];
}

impl TaskLike for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}
