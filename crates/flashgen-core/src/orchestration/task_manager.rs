use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Mutex, Notify, Semaphore};
use tokio::time::timeout;
use uuid::Uuid;

use crate::models::{
    CoreError, CoreErrorKind, JsonMap, TaskId, TaskRecord, TaskSnapshot, TaskStatus,
    TerminalTaskPayload,
};
use crate::orchestration::{OrchestrationResult, TaskCancellationToken};
use crate::persistence::TaskStore;
use crate::registry::StrategyRegistry;
use crate::strategies::StrategyInvocation;

pub const DEFAULT_MAX_WORKERS: usize = 4;

const MAX_TASK_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct TaskManager {
    inner: Arc<Mutex<ManagerState>>,
    registry: Arc<StrategyRegistry>,
    store: Arc<dyn TaskStore>,
    worker_permits: Arc<Semaphore>,
}

#[derive(Default)]
struct ManagerState {
    tasks: HashMap<TaskId, TaskRecord>,
    cancel_flags: HashMap<TaskId, Arc<AtomicBool>>,
    completion_notifiers: HashMap<TaskId, Arc<Notify>>,
}

impl TaskManager {
    pub fn new(registry: StrategyRegistry, store: Arc<dyn TaskStore>) -> Self {
        Self::with_max_workers(registry, store, DEFAULT_MAX_WORKERS)
    }

    pub fn with_max_workers(
        registry: StrategyRegistry,
        store: Arc<dyn TaskStore>,
        max_workers: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManagerState::default())),
            registry: Arc::new(registry),
            store,
            worker_permits: Arc::new(Semaphore::new(max_workers.max(1))),
        }
    }

    /// Records the task as PENDING and schedules it on the worker pool.
    /// The strategy name is resolved by the worker, not here; an unknown
    /// strategy surfaces later as a FAILED record.
    pub async fn submit(&self, strategy: &str, params: JsonMap) -> OrchestrationResult<TaskId> {
        let task_id = derive_task_id(strategy, &params)?;

        let cancel_flag = {
            let mut state = self.inner.lock().await;
            if state.tasks.contains_key(&task_id) {
                return Err(CoreError {
                    strategy: Some(strategy.to_string()),
                    task: Some(task_id.clone()),
                    kind: CoreErrorKind::InvalidInput,
                    message: format!("task '{task_id}' is already tracked"),
                });
            }

            state.tasks.insert(
                task_id.clone(),
                TaskRecord {
                    task_id: task_id.clone(),
                    strategy: strategy.to_string(),
                    params: params.clone(),
                    status: TaskStatus::Pending,
                    result: None,
                    error: None,
                    cancel_requested: false,
                },
            );

            let cancel_flag = Arc::new(AtomicBool::new(false));
            state.cancel_flags.insert(task_id.clone(), cancel_flag.clone());
            state
                .completion_notifiers
                .insert(task_id.clone(), Arc::new(Notify::new()));

            cancel_flag
        };

        let manager = self.clone();
        let worker_task_id = task_id.clone();
        let strategy_name = strategy.to_string();
        tokio::spawn(async move {
            manager
                .run_task(worker_task_id, strategy_name, params, cancel_flag)
                .await;
        });

        Ok(task_id)
    }

    pub async fn get(&self, task_id: &TaskId) -> OrchestrationResult<Option<TaskSnapshot>> {
        {
            let state = self.inner.lock().await;
            if let Some(record) = state.tasks.get(task_id) {
                return Ok(Some(TaskSnapshot::from_record(record)));
            }
        }

        let store = self.store.clone();
        let lookup = task_id.clone();
        let persisted = tokio::task::spawn_blocking(move || store.load(&lookup))
            .await
            .map_err(|join_error| CoreError {
                strategy: None,
                task: Some(task_id.clone()),
                kind: CoreErrorKind::Internal,
                message: format!("task store join failure: {join_error}"),
            })??;

        Ok(persisted.map(TaskSnapshot::from_payload))
    }

    /// Best-effort cancellation. A PENDING task that has not reached a worker
    /// is cancelled directly; a RUNNING task only gets `cancel_requested` set
    /// and transitions after its strategy returns. Returns whether the
    /// request was accepted.
    pub async fn cancel(&self, task_id: &TaskId) -> OrchestrationResult<bool> {
        let pending_payload = {
            let mut state = self.inner.lock().await;
            let Some(record) = state.tasks.get_mut(task_id) else {
                return Ok(false);
            };
            if record.status.is_terminal() {
                return Ok(false);
            }

            match record.status {
                TaskStatus::Pending => {
                    record.status = TaskStatus::Cancelled;
                    if let Some(flag) = state.cancel_flags.remove(task_id) {
                        flag.store(true, Ordering::SeqCst);
                    }
                    Some(TerminalTaskPayload {
                        task_id: task_id.clone(),
                        status: TaskStatus::Cancelled,
                        result: None,
                        error: None,
                    })
                }
                _ => {
                    record.cancel_requested = true;
                    if let Some(flag) = state.cancel_flags.get(task_id) {
                        flag.store(true, Ordering::SeqCst);
                    }
                    None
                }
            }
        };

        if let Some(payload) = pending_payload {
            self.persist_terminal(&payload).await;
            self.notify_completion(task_id).await;
        }

        Ok(true)
    }

    pub async fn wait_for_terminal(
        &self,
        task_id: &TaskId,
        timeout_duration: Option<Duration>,
    ) -> OrchestrationResult<TaskSnapshot> {
        loop {
            let (snapshot, notify) = {
                let state = self.inner.lock().await;
                let record = state.tasks.get(task_id).ok_or_else(|| CoreError {
                    strategy: None,
                    task: Some(task_id.clone()),
                    kind: CoreErrorKind::NotFound,
                    message: format!("unknown task id '{task_id}'"),
                })?;
                let notify = state
                    .completion_notifiers
                    .get(task_id)
                    .cloned()
                    .ok_or_else(|| CoreError {
                        strategy: None,
                        task: Some(task_id.clone()),
                        kind: CoreErrorKind::Internal,
                        message: format!("missing completion notifier for task '{task_id}'"),
                    })?;
                (TaskSnapshot::from_record(record), notify)
            };

            if snapshot.status.is_terminal() {
                return Ok(snapshot);
            }

            if let Some(duration) = timeout_duration {
                timeout(duration, notify.notified())
                    .await
                    .map_err(|_| CoreError {
                        strategy: snapshot.strategy.clone(),
                        task: Some(task_id.clone()),
                        kind: CoreErrorKind::Timeout,
                        message: format!("timed out waiting for task '{task_id}' to finish"),
                    })?;
            } else {
                notify.notified().await;
            }
        }
    }

    async fn run_task(
        &self,
        task_id: TaskId,
        strategy_name: String,
        params: JsonMap,
        cancel_flag: Arc<AtomicBool>,
    ) {
        let permit = match self.worker_permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        if !self.set_running_if_pending(&task_id).await {
            drop(permit);
            return;
        }

        let token = TaskCancellationToken::from_flag(cancel_flag.clone());
        let outcome = self
            .execute_strategy(&task_id, &strategy_name, params, token)
            .await;

        let payload = {
            let mut state = self.inner.lock().await;
            let Some(record) = state.tasks.get_mut(&task_id) else {
                drop(permit);
                return;
            };

            let payload = match outcome {
                Ok(result) => {
                    if record.cancel_requested || cancel_flag.load(Ordering::SeqCst) {
                        record.status = TaskStatus::Cancelled;
                        TerminalTaskPayload {
                            task_id: task_id.clone(),
                            status: TaskStatus::Cancelled,
                            result: None,
                            error: None,
                        }
                    } else {
                        record.status = TaskStatus::Success;
                        record.result = Some(result.clone());
                        TerminalTaskPayload {
                            task_id: task_id.clone(),
                            status: TaskStatus::Success,
                            result: Some(result),
                            error: None,
                        }
                    }
                }
                Err(error) => {
                    tracing::error!(
                        task_id = %task_id,
                        strategy = %strategy_name,
                        kind = ?error.kind,
                        message = %error.message,
                        "task execution failed"
                    );
                    record.status = TaskStatus::Failed;
                    record.error = Some(error.message.clone());
                    TerminalTaskPayload {
                        task_id: task_id.clone(),
                        status: TaskStatus::Failed,
                        result: None,
                        error: Some(error.message),
                    }
                }
            };

            state.cancel_flags.remove(&task_id);
            payload
        };

        // In-memory update above always precedes the persisted write.
        self.persist_terminal(&payload).await;
        self.notify_completion(&task_id).await;
        drop(permit);
    }

    async fn execute_strategy(
        &self,
        task_id: &TaskId,
        strategy_name: &str,
        params: JsonMap,
        token: TaskCancellationToken,
    ) -> OrchestrationResult<JsonMap> {
        let strategy = self.registry.resolve(strategy_name)?;
        let invocation = StrategyInvocation {
            task_id: task_id.clone(),
            params,
            cancellation: token,
        };

        tokio::task::spawn_blocking(move || strategy.run(invocation))
            .await
            .map_err(|join_error| CoreError {
                strategy: Some(strategy_name.to_string()),
                task: Some(task_id.clone()),
                kind: CoreErrorKind::Internal,
                message: format!("strategy execution join failure: {join_error}"),
            })?
    }

    async fn set_running_if_pending(&self, task_id: &TaskId) -> bool {
        let mut state = self.inner.lock().await;
        let Some(record) = state.tasks.get_mut(task_id) else {
            return false;
        };
        if record.status != TaskStatus::Pending {
            return false;
        }
        record.status = TaskStatus::Running;
        true
    }

    async fn persist_terminal(&self, payload: &TerminalTaskPayload) {
        let store = self.store.clone();
        let to_save = payload.clone();
        let saved = tokio::task::spawn_blocking(move || store.save(&to_save)).await;

        match saved {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                // The in-memory terminal record stays authoritative even when
                // the durable copy cannot be written.
                tracing::error!(
                    task_id = %payload.task_id,
                    status = ?payload.status,
                    kind = ?error.kind,
                    message = %error.message,
                    "failed to persist terminal task record"
                );
            }
            Err(join_error) => {
                tracing::error!(
                    task_id = %payload.task_id,
                    status = ?payload.status,
                    message = %join_error,
                    "task persistence join failure"
                );
            }
        }
    }

    async fn notify_completion(&self, task_id: &TaskId) {
        let notify = {
            let state = self.inner.lock().await;
            state.completion_notifiers.get(task_id).cloned()
        };
        if let Some(notify) = notify {
            notify.notify_waiters();
        }
    }
}

fn derive_task_id(strategy: &str, params: &JsonMap) -> OrchestrationResult<TaskId> {
    let supplied = match params.get("taskId") {
        Some(Value::String(raw)) => Some(raw.clone()),
        Some(Value::Number(raw)) => Some(raw.to_string()),
        Some(_) => {
            return Err(invalid_task_id(
                strategy,
                "params 'taskId' must be a string or a number",
            ));
        }
        None => None,
    };

    let raw = supplied.unwrap_or_else(|| Uuid::new_v4().to_string());

    if raw.is_empty() {
        return Err(invalid_task_id(strategy, "task id must not be empty"));
    }
    if raw.len() > MAX_TASK_ID_LEN {
        return Err(invalid_task_id(strategy, "task id is too long"));
    }
    // Task ids name files in the persistence store.
    if !raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid_task_id(
            strategy,
            "task id may only contain ASCII alphanumerics, '.', '_', and '-'",
        ));
    }

    Ok(TaskId(raw))
}

fn invalid_task_id(strategy: &str, message: &str) -> CoreError {
    CoreError {
        strategy: Some(strategy.to_string()),
        task: None,
        kind: CoreErrorKind::InvalidInput,
        message: message.to_string(),
    }
}
