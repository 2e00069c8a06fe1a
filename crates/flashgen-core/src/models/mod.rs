pub mod error;
pub mod task;

pub use error::{CoreError, CoreErrorKind};
pub use task::{JsonMap, TaskId, TaskRecord, TaskSnapshot, TaskStatus, TerminalTaskPayload};
