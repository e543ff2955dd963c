use crate::clock::Clock;
use crate::error::AppError;
use crate::model::Task;
use crate::storage::json_store;
use crate::storage::lock::LockFile;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Return a new record with `now` appended to the execution history.
///
/// The input is left untouched; callers replace the stored record as a whole.
pub fn record_execution(task: &Task, now: i64) -> Task {
    task.with_execution(now)
}

/// Serialises execution requests per task.
///
/// A request for a task that already has one in flight, in this process or
/// in another one sharing the store, is rejected with [`AppError::Cancelled`]
/// instead of being queued.
#[derive(Debug, Default)]
pub struct ExecutionRecorder {
    in_flight: Mutex<Vec<String>>,
}

/// Marks a task as in flight until dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    recorder: &'a ExecutionRecorder,
    task_id: String,
}

impl ExecutionRecorder {
    pub const fn new() -> Self {
        Self {
            in_flight: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn try_begin(&self, task_id: &str) -> Option<InFlightGuard<'_>> {
        let mut in_flight = self.lock();
        if in_flight.iter().any(|id| id == task_id) {
            return None;
        }
        in_flight.push(task_id.to_string());
        Some(InFlightGuard {
            recorder: self,
            task_id: task_id.to_string(),
        })
    }

    pub fn is_in_flight(&self, task_id: &str) -> bool {
        self.lock().iter().any(|id| id == task_id)
    }

    /// Append the current time to the stored task's history and persist it.
    pub fn record_with_path(
        &self,
        path: &Path,
        task_id: &str,
        clock: &dyn Clock,
    ) -> Result<Task, AppError> {
        let trimmed_id = task_id.trim();
        if trimmed_id.is_empty() {
            return Err(AppError::invalid_input("id is required"));
        }

        let Some(_guard) = self.try_begin(trimmed_id) else {
            debug!(task_id = trimmed_id, "execution already in flight, dropping request");
            return Err(AppError::cancelled(format!(
                "execution of {trimmed_id} already in progress"
            )));
        };

        let marker = json_store::in_flight_path(path, trimmed_id);
        let Some(_marker) = LockFile::try_acquire(&marker)? else {
            debug!(task_id = trimmed_id, "execution in flight in another process, dropping request");
            return Err(AppError::cancelled(format!(
                "execution of {trimmed_id} already in progress"
            )));
        };

        let _write = json_store::lock_for_write(path)?;
        let mut state = json_store::load_state(path)?;
        let current = state
            .find(trimmed_id)
            .ok_or_else(|| AppError::not_found(format!("task {trimmed_id} not found")))?;

        let updated = record_execution(current, clock.now_millis());
        state.replace(updated.clone())?;
        json_store::save_state(path, &state)?;

        info!(
            task_id = trimmed_id,
            executions = updated.execution_count(),
            "recorded task execution"
        );
        Ok(updated)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.recorder.lock().retain(|id| id != &self.task_id);
    }
}
