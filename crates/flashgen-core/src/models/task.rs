use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub type JsonMap = serde_json::Map<String, serde_json::Value>;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub strategy: String,
    pub params: JsonMap,
    pub status: TaskStatus,
    pub result: Option<JsonMap>,
    pub error: Option<String>,
    pub cancel_requested: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub strategy: Option<String>,
    pub params: Option<JsonMap>,
    pub result: Option<JsonMap>,
    pub error: Option<String>,
}

impl TaskSnapshot {
    pub fn from_record(record: &TaskRecord) -> Self {
        Self {
            task_id: record.task_id.clone(),
            status: record.status,
            strategy: Some(record.strategy.clone()),
            params: Some(record.params.clone()),
            result: record.result.clone(),
            error: record.error.clone(),
        }
    }

    pub fn from_payload(payload: TerminalTaskPayload) -> Self {
        Self {
            task_id: payload.task_id,
            status: payload.status,
            strategy: None,
            params: None,
            result: payload.result,
            error: payload.error,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerminalTaskPayload {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
