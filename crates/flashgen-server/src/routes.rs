use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use flashgen_core::models::{JsonMap, TaskId, TaskSnapshot, TaskStatus};
use flashgen_core::orchestration::TaskManager;

use crate::error::ServerError;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub strategy: String,
    #[serde(default)]
    pub params: JsonMap,
}

#[derive(Debug, Serialize)]
pub struct CreatedTask {
    pub task_id: TaskId,
}

#[derive(Debug, Serialize)]
pub struct CancelledTask {
    pub task_id: TaskId,
    pub status: TaskStatus,
}

pub fn router(manager: Arc<TaskManager>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks", post(create_task))
        .route("/api/tasks/:task_id", get(get_task))
        .route("/api/tasks/:task_id/cancel", post(cancel_task))
        .with_state(manager)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn create_task(
    State(manager): State<Arc<TaskManager>>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<Json<ApiResponse<CreatedTask>>, ServerError> {
    let task_id = manager.submit(&request.strategy, request.params).await?;
    tracing::info!(task = %task_id, strategy = %request.strategy, "task accepted");
    Ok(Json(ApiResponse::success(CreatedTask { task_id })))
}

async fn get_task(
    State(manager): State<Arc<TaskManager>>,
    Path(task_id): Path<String>,
) -> Result<Json<ApiResponse<TaskSnapshot>>, ServerError> {
    let task_id = TaskId::from(task_id);
    let snapshot = manager
        .get(&task_id)
        .await?
        .ok_or(ServerError::TaskNotFound(task_id))?;
    Ok(Json(ApiResponse::success(snapshot)))
}

async fn cancel_task(
    State(manager): State<Arc<TaskManager>>,
    Path(task_id): Path<String>,
) -> Result<Json<CancelledTask>, ServerError> {
    let task_id = TaskId::from(task_id);
    if !manager.cancel(&task_id).await? {
        return Err(ServerError::CancelRejected(task_id));
    }
    let snapshot = manager
        .get(&task_id)
        .await?
        .ok_or_else(|| ServerError::TaskNotFound(task_id.clone()))?;
    tracing::info!(task = %task_id, status = ?snapshot.status, "cancellation accepted");
    Ok(Json(CancelledTask {
        task_id,
        status: snapshot.status,
    }))
}
