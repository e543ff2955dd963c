use crate::error::AppError;
use crate::model::Task;
use crate::storage::lock::LockFile;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "RETASK_STORE_PATH";
pub const WRITE_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Task>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub tasks: Vec<Task>,
}

impl TaskState {
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Swap in a whole new record for the task with the same id.
    pub fn replace(&mut self, updated: Task) -> Result<(), AppError> {
        let slot = self
            .tasks
            .iter_mut()
            .find(|task| task.id == updated.id)
            .ok_or_else(|| AppError::not_found(format!("task {} not found", updated.id)))?;
        *slot = updated;
        Ok(())
    }
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("retask").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("retask")
            .join(STORE_FILE_NAME))
    }
}

pub fn load_state(path: &Path) -> Result<TaskState, AppError> {
    if !path.exists() {
        return Ok(TaskState::default());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let stored: StoredTasks =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    for task in &stored.tasks {
        if task.min_interval_ms <= 0 || task.max_interval_ms < task.min_interval_ms {
            return Err(AppError::invalid_data(format!(
                "task {} has invalid intervals",
                task.id
            )));
        }
    }

    for (index, task) in stored.tasks.iter().enumerate() {
        if stored.tasks[..index].iter().any(|other| other.id == task.id) {
            return Err(AppError::invalid_data(format!("duplicate task id {}", task.id)));
        }
    }

    debug!(path = %path.display(), tasks = stored.tasks.len(), "loaded task store");
    Ok(TaskState {
        tasks: stored.tasks,
    })
}

/// Write the whole store to a sibling temp file and rename it into place, so
/// concurrent readers see either the previous or the new contents.
pub fn save_state(path: &Path, state: &TaskState) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let stored = StoredTasks {
        schema_version: SCHEMA_VERSION,
        tasks: state.tasks.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;

    let tmp_path = temp_sibling(path);
    if let Err(err) = write_private(&tmp_path, &content)
        .and_then(|()| std::fs::rename(&tmp_path, path))
    {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(AppError::io(err.to_string()));
    }
    debug!(path = %path.display(), tasks = state.tasks.len(), "saved task store");

    Ok(())
}

fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    std::fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| STORE_FILE_NAME.into());
    name.push(suffix);
    path.with_file_name(name)
}

/// Per-save temp file name, unique across processes and threads.
fn temp_sibling(path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0);
    let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    sibling_with_suffix(
        path,
        &format!(".{}.{nanos}.{sequence}.tmp", std::process::id()),
    )
}

pub fn write_lock_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".lock")
}

/// Marker held while an execution of `task_id` is being recorded.
pub fn in_flight_path(path: &Path, task_id: &str) -> PathBuf {
    let safe_id: String = task_id
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' { ch } else { '_' })
        .collect();
    sibling_with_suffix(path, &format!(".{safe_id}.inflight"))
}

/// Serialise load-modify-save cycles on the store, across threads and
/// processes. Hold the returned guard until the save has completed.
pub fn lock_for_write(path: &Path) -> Result<LockFile, AppError> {
    LockFile::acquire(&write_lock_path(path), WRITE_LOCK_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::{
        SCHEMA_VERSION, TaskState, in_flight_path, load_state, lock_for_write, save_state,
        temp_sibling, write_lock_path,
    };
    use crate::model::Task;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("retask-{nanos}-{file_name}"))
    }

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            name: "clean bathroom".to_string(),
            description: "sink, shower and floor".to_string(),
            min_interval_ms: 3_000,
            max_interval_ms: 5_000,
            points: 15,
            created_at: "2025-12-20T00:00:00Z".to_string(),
            execution_timestamps_ms: vec![1_000, 2_000],
        }
    }

    #[test]
    fn missing_store_is_empty() {
        let path = temp_path("missing.json");
        let state = load_state(&path).unwrap();
        assert!(state.tasks.is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("tasks.json");
        let state = TaskState {
            tasks: vec![task("task-1")],
        };

        save_state(&path, &state).unwrap();
        let loaded = load_state(&path).unwrap();
        let prefix = path.file_name().unwrap().to_string_lossy().to_string();
        let leftovers: Vec<String> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with(&prefix) && name.ends_with(".tmp"))
            .collect();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, state);
        assert!(leftovers.is_empty(), "temp files left: {leftovers:?}");
    }

    #[test]
    fn temp_names_are_unique_per_save() {
        let path = temp_path("unique.json");
        let first = temp_sibling(&path);
        let second = temp_sibling(&path);

        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
        assert!(first.to_string_lossy().ends_with(".tmp"));
    }

    #[test]
    fn concurrent_saves_do_not_fail() {
        let path = temp_path("concurrent-save.json");

        let results: Vec<_> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|index| {
                    let path = &path;
                    scope.spawn(move || {
                        save_state(
                            path,
                            &TaskState {
                                tasks: vec![task(&format!("task-{index}"))],
                            },
                        )
                    })
                })
                .collect();
            workers.into_iter().map(|worker| worker.join().unwrap()).collect()
        });
        let loaded = load_state(&path).unwrap();
        fs::remove_file(&path).ok();

        assert!(results.iter().all(|result| result.is_ok()));
        assert_eq!(loaded.tasks.len(), 1);
    }

    #[test]
    fn write_lock_is_exclusive() {
        let path = temp_path("locked.json");
        let held = lock_for_write(&path).unwrap();

        assert_eq!(held.path(), write_lock_path(&path).as_path());
        assert!(crate::storage::lock::LockFile::try_acquire(&write_lock_path(&path))
            .unwrap()
            .is_none());
        drop(held);
        assert!(lock_for_write(&path).is_ok());
    }

    #[test]
    fn in_flight_path_sanitises_task_id() {
        let path = PathBuf::from("/tmp/store/tasks.json");
        assert_eq!(
            in_flight_path(&path, "task-1"),
            PathBuf::from("/tmp/store/tasks.json.task-1.inflight")
        );
        assert_eq!(
            in_flight_path(&path, "../evil id"),
            PathBuf::from("/tmp/store/tasks.json.___evil_id.inflight")
        );
    }

    #[test]
    fn replace_swaps_matching_record() {
        let mut state = TaskState {
            tasks: vec![task("task-1"), task("task-2")],
        };
        let mut updated = task("task-2");
        updated.execution_timestamps_ms.push(9_000);

        state.replace(updated.clone()).unwrap();

        assert_eq!(state.find("task-2"), Some(&updated));
        assert_eq!(state.find("task-1"), Some(&task("task-1")));
    }

    #[test]
    fn replace_rejects_unknown_task() {
        let mut state = TaskState::default();
        let err = state.replace(task("task-9")).unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn schema_version_must_match() {
        let path = temp_path("bad-schema.json");
        let bad = format!(
            "{{\n  \"schema_version\": {},\n  \"tasks\": []\n}}",
            SCHEMA_VERSION + 1
        );
        fs::write(&path, bad).unwrap();

        let err = load_state(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_corrupt_json() {
        let path = temp_path("corrupt.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_state(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_inverted_intervals() {
        let path = temp_path("inverted.json");
        let content = serde_json::json!({
            "schema_version": 1,
            "tasks": [{
                "id": "task-1",
                "name": "demo",
                "min_interval_ms": 10,
                "max_interval_ms": 5,
                "created_at": "2025-12-20T00:00:00Z"
            }]
        });
        fs::write(&path, content.to_string()).unwrap();

        let err = load_state(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let path = temp_path("duplicate.json");
        let state = TaskState {
            tasks: vec![task("task-1"), task("task-1")],
        };
        save_state(&path, &state).unwrap();

        let err = load_state(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[cfg(unix)]
    #[test]
    fn saved_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_path("private.json");
        save_state(&path, &TaskState::default()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        fs::remove_file(&path).ok();

        assert_eq!(mode & 0o777, 0o600);
    }
}
