pub mod code;
pub mod publish_video;
pub mod research;
pub mod rewrite;
pub mod summarize;

pub use code::CodeStrategy;
pub use publish_video::{PublishTiming, PublishVideoStrategy};
pub use research::ResearchStrategy;
pub use rewrite::RewriteStrategy;
pub use summarize::SummarizeStrategy;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::models::{CoreError, JsonMap, TaskId};
use crate::orchestration::TaskCancellationToken;

pub type StrategyResult<T> = Result<T, CoreError>;

pub type StrategyConstructor = fn() -> StrategyResult<Arc<dyn TaskStrategy>>;

const MAX_SIMULATED_DELAY_SECS: f64 = 10.0;

#[derive(Clone, Debug)]
pub struct StrategyInvocation {
    pub task_id: TaskId,
    pub params: JsonMap,
    pub cancellation: TaskCancellationToken,
}

/// A named, independently pluggable unit of work. `run` executes once,
/// synchronously, on a blocking worker. Expected business-logic failures
/// (missing parameters and the like) are reported as data via
/// [`business_error`], not as `Err`; only unexpected failures return `Err`.
pub trait TaskStrategy: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn run(&self, invocation: StrategyInvocation) -> StrategyResult<JsonMap>;
}

/// Startup registration walk. Constructors are fallible so that a strategy
/// with unsatisfiable requirements is skipped without aborting discovery of
/// the others.
pub fn builtin_registrations() -> Vec<(&'static str, StrategyConstructor)> {
    vec![
        ("research", || Ok(Arc::new(ResearchStrategy))),
        ("summarize", || Ok(Arc::new(SummarizeStrategy))),
        ("rewrite", || Ok(Arc::new(RewriteStrategy))),
        ("code", || Ok(Arc::new(CodeStrategy))),
        ("publish_video", || {
            PublishVideoStrategy::from_env()
                .map(|strategy| Arc::new(strategy) as Arc<dyn TaskStrategy>)
        }),
    ]
}

pub(crate) fn business_error(message: impl Into<String>) -> JsonMap {
    let mut map = JsonMap::new();
    map.insert("error".to_string(), Value::String(message.into()));
    map
}

pub(crate) fn param_str<'a>(params: &'a JsonMap, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Honors the shared `sleep` / `simulate_delay` convention: an optional
/// artificial delay in seconds, capped so a typo cannot park a worker.
pub(crate) fn simulated_delay(params: &JsonMap) {
    let requested = params
        .get("sleep")
        .or_else(|| params.get("simulate_delay"))
        .and_then(Value::as_f64);

    if let Some(seconds) = requested
        && seconds > 0.0
    {
        std::thread::sleep(Duration::from_secs_f64(
            seconds.min(MAX_SIMULATED_DELAY_SECS),
        ));
    }
}
