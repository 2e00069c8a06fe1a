use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

use flashgen_core::models::{CoreErrorKind, JsonMap, TaskStatus};
use flashgen_core::orchestration::TaskManager;
use flashgen_core::persistence::JsonFileTaskStore;
use flashgen_core::registry::StrategyRegistry;
use flashgen_core::strategies::{
    PublishTiming, PublishVideoStrategy, StrategyInvocation, StrategyResult, TaskStrategy,
};

const WAIT: Option<Duration> = Some(Duration::from_secs(5));

fn builtin_manager(max_workers: usize) -> (TaskManager, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileTaskStore::new(dir.path()).unwrap());
    let registry = StrategyRegistry::builtin().unwrap();
    (
        TaskManager::with_max_workers(registry, store, max_workers),
        dir,
    )
}

fn research_params(topic: &str) -> JsonMap {
    let mut params = JsonMap::new();
    params.insert("topic".to_string(), Value::String(topic.to_string()));
    params
}

#[derive(Debug)]
struct ProbeStrategy {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl TaskStrategy for ProbeStrategy {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn run(&self, _invocation: StrategyInvocation) -> StrategyResult<JsonMap> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(80));
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(JsonMap::new())
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn research_task_reaches_success() {
    let (manager, _dir) = builtin_manager(4);

    let task_id = manager
        .submit("research", research_params("python"))
        .await
        .unwrap();
    let snapshot = manager.wait_for_terminal(&task_id, WAIT).await.unwrap();

    assert_eq!(snapshot.status, TaskStatus::Success);
    let result = snapshot.result.unwrap();
    assert_eq!(result.get("type").and_then(Value::as_str), Some("research"));
    assert!(snapshot.error.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_strategy_fails_with_not_found_error() {
    let (manager, _dir) = builtin_manager(4);

    let task_id = manager.submit("nope", JsonMap::new()).await.unwrap();
    let snapshot = manager.wait_for_terminal(&task_id, WAIT).await.unwrap();

    assert_eq!(snapshot.status, TaskStatus::Failed);
    let error = snapshot.error.unwrap();
    assert!(error.contains("'nope'"));
    assert!(error.contains("not found"));
    assert!(snapshot.result.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn business_errors_surface_as_success_with_error_payload() {
    let (manager, _dir) = builtin_manager(4);

    let task_id = manager.submit("research", JsonMap::new()).await.unwrap();
    let snapshot = manager.wait_for_terminal(&task_id, WAIT).await.unwrap();

    // "The job ran and determined it could not proceed" is not a crash.
    assert_eq!(snapshot.status, TaskStatus::Success);
    assert!(snapshot.error.is_none());
    let result = snapshot.result.unwrap();
    assert_eq!(
        result.get("error").and_then(Value::as_str),
        Some("missing 'topic' in params")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn get_of_never_submitted_task_is_none() {
    let (manager, _dir) = builtin_manager(4);

    assert!(manager.get(&"ghost".into()).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn terminal_snapshots_are_idempotent() {
    let (manager, _dir) = builtin_manager(4);

    let task_id = manager
        .submit("research", research_params("rust"))
        .await
        .unwrap();
    manager.wait_for_terminal(&task_id, WAIT).await.unwrap();

    let first = manager.get(&task_id).await.unwrap().unwrap();
    let second = manager.get(&task_id).await.unwrap().unwrap();
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_a_pending_task_yields_cancelled_without_result() {
    let (manager, _dir) = builtin_manager(1);

    // Occupy the single worker so the second submission stays PENDING.
    let mut blocker_params = research_params("blocker");
    blocker_params.insert("sleep".to_string(), Value::from(0.5));
    let blocker = manager.submit("research", blocker_params).await.unwrap();

    let mut victim_params = research_params("victim");
    victim_params.insert("sleep".to_string(), Value::from(0.5));
    let victim = manager.submit("research", victim_params).await.unwrap();
    assert!(manager.cancel(&victim).await.unwrap());

    let snapshot = manager.wait_for_terminal(&victim, WAIT).await.unwrap();
    assert_eq!(snapshot.status, TaskStatus::Cancelled);
    assert!(snapshot.result.is_none());
    assert!(snapshot.error.is_none());

    let blocker_snapshot = manager.wait_for_terminal(&blocker, WAIT).await.unwrap();
    assert_eq!(blocker_snapshot.status, TaskStatus::Success);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_a_running_task_takes_effect_after_its_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileTaskStore::new(dir.path()).unwrap());
    let mut registry = StrategyRegistry::new();
    registry
        .register(Arc::new(PublishVideoStrategy::new(PublishTiming {
            login: Duration::from_millis(200),
            chunk: Duration::from_millis(50),
            audit_step: Duration::from_millis(50),
        })))
        .unwrap();
    let manager = TaskManager::with_max_workers(registry, store, 4);

    let mut params = JsonMap::new();
    params.insert("username".to_string(), Value::String("creator".to_string()));
    params.insert("password".to_string(), Value::String("secret".to_string()));
    params.insert(
        "video_path".to_string(),
        Value::String("clip.mp4".to_string()),
    );
    let task_id = manager.submit("publish_video", params).await.unwrap();

    // Wait until the worker picked it up, then request cancellation.
    for _ in 0..100 {
        let snapshot = manager.get(&task_id).await.unwrap().unwrap();
        if snapshot.status == TaskStatus::Running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(manager.cancel(&task_id).await.unwrap());

    let snapshot = manager.wait_for_terminal(&task_id, WAIT).await.unwrap();
    assert_eq!(snapshot.status, TaskStatus::Cancelled);
    assert!(snapshot.result.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_a_terminal_task_is_not_accepted() {
    let (manager, _dir) = builtin_manager(4);

    let task_id = manager
        .submit("research", research_params("done"))
        .await
        .unwrap();
    manager.wait_for_terminal(&task_id, WAIT).await.unwrap();

    assert!(!manager.cancel(&task_id).await.unwrap());
    let snapshot = manager.get(&task_id).await.unwrap().unwrap();
    assert_eq!(snapshot.status, TaskStatus::Success);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_an_unknown_task_is_not_accepted() {
    let (manager, _dir) = builtin_manager(4);

    assert!(!manager.cancel(&"ghost".into()).await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn caller_supplied_task_id_is_used_and_duplicates_are_rejected() {
    let (manager, _dir) = builtin_manager(4);

    let mut params = research_params("ids");
    params.insert("taskId".to_string(), Value::String("custom-1".to_string()));
    let task_id = manager.submit("research", params.clone()).await.unwrap();
    assert_eq!(task_id.as_str(), "custom-1");

    let error = manager.submit("research", params).await.unwrap_err();
    assert_eq!(error.kind, CoreErrorKind::InvalidInput);
    assert!(error.message.contains("already tracked"));
}

#[tokio::test(flavor = "multi_thread")]
async fn task_ids_unfit_for_file_names_are_rejected() {
    let (manager, _dir) = builtin_manager(4);

    let mut params = research_params("ids");
    params.insert(
        "taskId".to_string(),
        Value::String("../escape".to_string()),
    );
    let error = manager.submit("research", params).await.unwrap_err();
    assert_eq!(error.kind, CoreErrorKind::InvalidInput);
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_pool_bounds_parallel_execution() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileTaskStore::new(dir.path()).unwrap());
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let mut registry = StrategyRegistry::new();
    registry
        .register(Arc::new(ProbeStrategy {
            current: current.clone(),
            peak: peak.clone(),
        }))
        .unwrap();
    let manager = TaskManager::with_max_workers(registry, store, 2);

    let mut task_ids = Vec::new();
    for _ in 0..5 {
        task_ids.push(manager.submit("probe", JsonMap::new()).await.unwrap());
    }
    for task_id in &task_ids {
        let snapshot = manager.wait_for_terminal(task_id, WAIT).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Success);
    }

    assert!(peak.load(Ordering::SeqCst) <= 2);
}
