pub mod json_store;

pub use json_store::JsonFileTaskStore;

use crate::models::{CoreError, TaskId, TerminalTaskPayload};

pub type PersistenceResult<T> = Result<T, CoreError>;

pub trait TaskStore: Send + Sync {
    fn save(&self, payload: &TerminalTaskPayload) -> PersistenceResult<()>;

    fn load(&self, task_id: &TaskId) -> PersistenceResult<Option<TerminalTaskPayload>>;
}
