use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::models::{CoreError, CoreErrorKind, TaskId, TerminalTaskPayload};
use crate::persistence::{PersistenceResult, TaskStore};

pub const DEFAULT_STORE_DIR: &str = "data";

pub struct JsonFileTaskStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileTaskStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|error| CoreError {
            strategy: None,
            task: None,
            kind: CoreErrorKind::StorageFailure,
            message: format!(
                "failed to create task store directory '{}': {error}",
                base_dir.display()
            ),
        })?;

        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn task_file(&self, task_id: &TaskId) -> PathBuf {
        self.base_dir.join(format!("task_{task_id}.json"))
    }
}

impl TaskStore for JsonFileTaskStore {
    fn save(&self, payload: &TerminalTaskPayload) -> PersistenceResult<()> {
        let serialized =
            serde_json::to_vec_pretty(payload).map_err(|error| storage_error(&payload.task_id, format!("failed to serialize task record: {error}")))?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| storage_error(&payload.task_id, "task store mutex poisoned".to_string()))?;

        fs::write(self.task_file(&payload.task_id), serialized).map_err(|error| {
            storage_error(
                &payload.task_id,
                format!("failed to write task record: {error}"),
            )
        })
    }

    fn load(&self, task_id: &TaskId) -> PersistenceResult<Option<TerminalTaskPayload>> {
        let path = self.task_file(task_id);

        let raw = {
            let _guard = self
                .write_lock
                .lock()
                .map_err(|_| storage_error(task_id, "task store mutex poisoned".to_string()))?;

            match fs::read(&path) {
                Ok(raw) => raw,
                Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
                Err(error) => {
                    return Err(storage_error(
                        task_id,
                        format!("failed to read task record: {error}"),
                    ));
                }
            }
        };

        serde_json::from_slice(&raw).map(Some).map_err(|error| {
            storage_error(
                task_id,
                format!("failed to deserialize task record: {error}"),
            )
        })
    }
}

fn storage_error(task_id: &TaskId, message: String) -> CoreError {
    CoreError {
        strategy: None,
        task: Some(task_id.clone()),
        kind: CoreErrorKind::StorageFailure,
        message,
    }
}
