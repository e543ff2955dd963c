use crate::model::{TaskStatusColor, TaskTimeStatus};
use serde::{Deserialize, Serialize};

/// A recurring task as persisted in the store.
///
/// Execution timestamps are append-only and not guaranteed to be sorted, so
/// the last execution is always derived as their maximum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub min_interval_ms: i64,
    pub max_interval_ms: i64,
    #[serde(default)]
    pub points: u32,
    pub created_at: String,
    #[serde(default)]
    pub execution_timestamps_ms: Vec<i64>,
}

impl Task {
    pub fn last_executed(&self) -> Option<i64> {
        self.execution_timestamps_ms.iter().copied().max()
    }

    pub fn execution_count(&self) -> usize {
        self.execution_timestamps_ms.len()
    }

    /// Moment the max interval runs out. Never-executed tasks count from the epoch.
    pub fn due_at(&self) -> i64 {
        self.last_executed()
            .unwrap_or(0)
            .saturating_add(self.max_interval_ms)
    }

    /// Copy of this record with `now` appended to the execution history.
    pub fn with_execution(&self, now: i64) -> Task {
        let mut updated = self.clone();
        updated.execution_timestamps_ms.push(now);
        updated
    }

    pub fn can_execute(&self, now: i64) -> bool {
        now >= self
            .last_executed()
            .unwrap_or(0)
            .saturating_add(self.min_interval_ms)
    }
}

/// List row: a task with its urgency evaluated at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskItem {
    pub id: String,
    pub name: String,
    pub color: TaskStatusColor,
    pub time_status: TaskTimeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub points: u32,
    pub min_interval_ms: i64,
    pub max_interval_ms: i64,
    pub number_of_executions: usize,
    pub last_executed: Option<i64>,
    pub can_execute: bool,
}
