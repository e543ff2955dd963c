use crate::clock::{Clock, SystemClock};
use crate::error::AppError;
use crate::model::{Task, TaskDetail, TaskItem};
use crate::recorder::ExecutionRecorder;
use crate::seed;
use crate::status::{classify_color, classify_time_status};
use crate::storage::json_store;
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

static RECORDER: ExecutionRecorder = ExecutionRecorder::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub min_interval_ms: i64,
    pub max_interval_ms: i64,
    pub points: u32,
}

pub fn add_task(new_task: NewTask) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    add_task_with_path(&path, new_task, &SystemClock)
}

pub fn list_tasks() -> Result<Vec<TaskItem>, AppError> {
    let path = json_store::store_path()?;
    list_tasks_with_path(&path, SystemClock.now_millis())
}

pub fn task_detail(id: &str) -> Result<TaskDetail, AppError> {
    let path = json_store::store_path()?;
    task_detail_with_path(&path, id, SystemClock.now_millis())
}

pub fn get_task_by_id(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    get_task_by_id_with_path(&path, id)
}

pub fn record_execution(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    RECORDER.record_with_path(&path, id, &SystemClock)
}

pub fn delete_task(id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    delete_task_with_path(&path, id)
}

pub fn seed_default_tasks() -> Result<usize, AppError> {
    let path = json_store::store_path()?;
    seed_default_tasks_with_path(&path, &SystemClock)
}

/// Evaluate one task's urgency at `now`.
pub fn evaluate_task(task: &Task, now: i64) -> TaskItem {
    let last_executed = task.last_executed();
    TaskItem {
        id: task.id.clone(),
        name: task.name.clone(),
        color: classify_color(
            now,
            last_executed.unwrap_or(0),
            task.min_interval_ms,
            task.max_interval_ms,
        ),
        time_status: classify_time_status(last_executed, task.max_interval_ms, now),
    }
}

pub fn detail_for(task: &Task, now: i64) -> TaskDetail {
    TaskDetail {
        id: task.id.clone(),
        name: task.name.clone(),
        description: task.description.clone(),
        points: task.points,
        min_interval_ms: task.min_interval_ms,
        max_interval_ms: task.max_interval_ms,
        number_of_executions: task.execution_count(),
        last_executed: task.last_executed(),
        can_execute: task.can_execute(now),
    }
}

pub(crate) fn rfc3339_from_millis(millis: i64) -> Result<String, AppError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|err| AppError::invalid_data(err.to_string()))?
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

fn validate_intervals(min_interval_ms: i64, max_interval_ms: i64) -> Result<(), AppError> {
    if min_interval_ms <= 0 || max_interval_ms <= 0 {
        return Err(AppError::invalid_input("intervals must be positive"));
    }
    if min_interval_ms > max_interval_ms {
        return Err(AppError::invalid_input(
            "min interval must not exceed max interval",
        ));
    }
    Ok(())
}

fn next_task_id(tasks: &[Task]) -> String {
    let highest = tasks
        .iter()
        .filter_map(|task| task.id.strip_prefix("task-"))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("task-{}", highest + 1)
}

pub(crate) fn add_task_with_path(
    path: &Path,
    new_task: NewTask,
    clock: &dyn Clock,
) -> Result<Task, AppError> {
    let trimmed_name = new_task.name.trim();
    if trimmed_name.is_empty() {
        return Err(AppError::invalid_input("name is required"));
    }
    validate_intervals(new_task.min_interval_ms, new_task.max_interval_ms)?;

    let _write = json_store::lock_for_write(path)?;
    let mut state = json_store::load_state(path)?;
    let task = Task {
        id: next_task_id(&state.tasks),
        name: trimmed_name.to_string(),
        description: new_task.description.trim().to_string(),
        min_interval_ms: new_task.min_interval_ms,
        max_interval_ms: new_task.max_interval_ms,
        points: new_task.points,
        created_at: rfc3339_from_millis(clock.now_millis())?,
        execution_timestamps_ms: Vec::new(),
    };

    state.tasks.push(task.clone());
    json_store::save_state(path, &state)?;
    info!(task_id = %task.id, "added task");

    Ok(task)
}

/// All tasks evaluated at `now`, soonest due first. Never-executed tasks
/// count from the epoch and therefore sort near the top.
pub(crate) fn list_tasks_with_path(path: &Path, now: i64) -> Result<Vec<TaskItem>, AppError> {
    let mut tasks = json_store::load_state(path)?.tasks;
    tasks.sort_by(|a, b| a.due_at().cmp(&b.due_at()).then_with(|| a.id.cmp(&b.id)));

    Ok(tasks.iter().map(|task| evaluate_task(task, now)).collect())
}

fn get_task_by_id_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }

    let state = json_store::load_state(path)?;
    state
        .tasks
        .into_iter()
        .find(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::not_found(format!("task {trimmed_id} not found")))
}

fn task_detail_with_path(path: &Path, id: &str, now: i64) -> Result<TaskDetail, AppError> {
    let task = get_task_by_id_with_path(path, id)?;
    Ok(detail_for(&task, now))
}

fn delete_task_with_path(path: &Path, id: &str) -> Result<Task, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }

    let _write = json_store::lock_for_write(path)?;
    let mut state = json_store::load_state(path)?;
    let index = state
        .tasks
        .iter()
        .position(|task| task.id == trimmed_id)
        .ok_or_else(|| AppError::not_found(format!("task {trimmed_id} not found")))?;

    let removed = state.tasks.remove(index);
    json_store::save_state(path, &state)?;
    info!(task_id = trimmed_id, "deleted task");

    Ok(removed)
}

/// Insert the example tasks into an empty store. Returns how many were added.
fn seed_default_tasks_with_path(path: &Path, clock: &dyn Clock) -> Result<usize, AppError> {
    let _write = json_store::lock_for_write(path)?;
    let mut state = json_store::load_state(path)?;
    if !state.tasks.is_empty() {
        info!("store already contains tasks, skipping default tasks");
        return Ok(0);
    }

    state.tasks = seed::default_tasks(clock.now_millis())?;
    json_store::save_state(path, &state)?;
    info!(count = state.tasks.len(), "inserted default tasks");

    Ok(state.tasks.len())
}
