use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque task identifier, stable for the task's lifetime.
pub type TaskId = String;

/// A point in either screen space or canvas space; the caller knows which.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Closed set of task kinds. Decides which executor behavior applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Input,
    Generation,
    Transformation,
    Analysis,
    HumanReview,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::Input,
        TaskType::Generation,
        TaskType::Transformation,
        TaskType::Analysis,
        TaskType::HumanReview,
    ];

    /// Default display label for a freshly added task.
    pub fn label(&self) -> &'static str {
        match self {
            TaskType::Input => "Input",
            TaskType::Generation => "Generation",
            TaskType::Transformation => "Transformation",
            TaskType::Analysis => "Analysis",
            TaskType::HumanReview => "Human Review",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            TaskType::Input => "input",
            TaskType::Generation => "generation",
            TaskType::Transformation => "transformation",
            TaskType::Analysis => "analysis",
            TaskType::HumanReview => "human_review",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        TaskType::ALL
            .into_iter()
            .find(|t| t.slug() == normalized)
            .ok_or_else(|| format!("unknown task type: {s}"))
    }
}

/// Metadata for file-like inputs (file, audio, video).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Where an INPUT task's value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "input_type", rename_all = "snake_case")]
pub enum InputSource {
    Text { value: String },
    File(FileMeta),
    Audio(FileMeta),
    Video(FileMeta),
}

impl Default for InputSource {
    fn default() -> Self {
        InputSource::Text {
            value: String::new(),
        }
    }
}

/// Per-type settings. Only the fields meaningful for a type exist on its variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskSettings {
    Input {
        #[serde(default)]
        source: InputSource,
    },
    Generation {
        /// Reference to an external prompt definition.
        #[serde(default)]
        prompt_id: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    Transformation {
        #[serde(default)]
        code: String,
    },
    Analysis {
        /// Context key to analyze; `None` analyzes the most recent upstream value.
        #[serde(default)]
        source_key: Option<String>,
    },
    HumanReview {
        #[serde(default)]
        instructions: Option<String>,
        #[serde(default)]
        source_key: Option<String>,
    },
}

impl TaskSettings {
    pub fn default_for(task_type: TaskType) -> Self {
        match task_type {
            TaskType::Input => TaskSettings::Input {
                source: InputSource::default(),
            },
            TaskType::Generation => TaskSettings::Generation {
                prompt_id: None,
                model: None,
            },
            TaskType::Transformation => TaskSettings::Transformation {
                code: String::new(),
            },
            TaskType::Analysis => TaskSettings::Analysis { source_key: None },
            TaskType::HumanReview => TaskSettings::HumanReview {
                instructions: None,
                source_key: None,
            },
        }
    }

    /// The task type these settings were written for.
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskSettings::Input { .. } => TaskType::Input,
            TaskSettings::Generation { .. } => TaskType::Generation,
            TaskSettings::Transformation { .. } => TaskType::Transformation,
            TaskSettings::Analysis { .. } => TaskType::Analysis,
            TaskSettings::HumanReview { .. } => TaskType::HumanReview,
        }
    }
}

/// Task configuration: the output key shared by all types plus per-type settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Name under which this task's output lands in the execution context.
    pub target_key: String,
    #[serde(flatten)]
    pub settings: TaskSettings,
}

impl TaskConfig {
    pub fn default_for(task_type: TaskType, target_key: impl Into<String>) -> Self {
        Self {
            target_key: target_key.into(),
            settings: TaskSettings::default_for(task_type),
        }
    }

    /// Settings to execute `task_type` with.
    ///
    /// A task whose type was changed after creation keeps its old settings;
    /// those are ignored here in favour of the new type's defaults.
    pub fn settings_for(&self, task_type: TaskType) -> TaskSettings {
        if self.settings.task_type() == task_type {
            self.settings.clone()
        } else {
            TaskSettings::default_for(task_type)
        }
    }
}

/// A node in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub name: String,
    pub config: TaskConfig,
    /// Canvas-space layout position. Never used for execution order.
    pub position: Point,
    /// Tasks that must reach a terminal state before this one runs.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
}

impl Task {
    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|d| d == id)
    }
}

/// Partial update merged by `GraphModel::update_task`.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub task_type: Option<TaskType>,
    pub config: Option<TaskConfig>,
    pub position: Option<Point>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.task_type.is_none()
            && self.config.is_none()
            && self.position.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_parse() {
        assert_eq!("generation".parse::<TaskType>(), Ok(TaskType::Generation));
        assert_eq!("Human-Review".parse::<TaskType>(), Ok(TaskType::HumanReview));
        assert!("render".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_settings_for_mismatched_type_uses_defaults() {
        let config = TaskConfig {
            target_key: "out".to_string(),
            settings: TaskSettings::Transformation {
                code: "tr a-z A-Z".to_string(),
            },
        };

        assert_eq!(
            config.settings_for(TaskType::Transformation),
            config.settings
        );
        assert_eq!(
            config.settings_for(TaskType::Analysis),
            TaskSettings::Analysis { source_key: None }
        );
    }

    #[test]
    fn test_config_json_shape() {
        let config = TaskConfig {
            target_key: "doc".to_string(),
            settings: TaskSettings::Input {
                source: InputSource::File(FileMeta {
                    name: "notes.md".to_string(),
                    mime_type: Some("text/markdown".to_string()),
                    size_bytes: Some(42),
                    path: None,
                }),
            },
        };

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["target_key"], "doc");
        assert_eq!(value["kind"], "input");
        assert_eq!(value["source"]["input_type"], "file");
        assert_eq!(value["source"]["name"], "notes.md");

        let back: TaskConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }
}
