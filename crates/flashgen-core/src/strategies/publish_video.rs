use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::models::{CoreError, CoreErrorKind, JsonMap};
use crate::strategies::{
    StrategyInvocation, StrategyResult, TaskStrategy, business_error, param_str,
};

const TIME_SCALE_ENV: &str = "FLASHGEN_PUBLISH_TIME_SCALE";

const LOGIN_DELAY: Duration = Duration::from_secs(1);
const CHUNK_DELAY: Duration = Duration::from_millis(500);
const AUDIT_STEP_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug)]
pub struct PublishTiming {
    pub login: Duration,
    pub chunk: Duration,
    pub audit_step: Duration,
}

impl Default for PublishTiming {
    fn default() -> Self {
        Self {
            login: LOGIN_DELAY,
            chunk: CHUNK_DELAY,
            audit_step: AUDIT_STEP_DELAY,
        }
    }
}

impl PublishTiming {
    fn scaled(scale: f64) -> Self {
        let default = Self::default();
        Self {
            login: default.login.mul_f64(scale),
            chunk: default.chunk.mul_f64(scale),
            audit_step: default.audit_step.mul_f64(scale),
        }
    }
}

/// Simulated social-video publish flow: login, chunked upload, audit. The
/// only built-in strategy that polls the cancellation token between phases;
/// the others finish in one step and rely on the manager's post-run check.
#[derive(Debug)]
pub struct PublishVideoStrategy {
    timing: PublishTiming,
}

impl PublishVideoStrategy {
    pub fn new(timing: PublishTiming) -> Self {
        Self { timing }
    }

    pub fn from_env() -> StrategyResult<Self> {
        let Ok(raw) = std::env::var(TIME_SCALE_ENV) else {
            return Ok(Self::new(PublishTiming::default()));
        };

        let scale: f64 = raw.parse().map_err(|_| invalid_time_scale(&raw))?;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(invalid_time_scale(&raw));
        }

        Ok(Self::new(PublishTiming::scaled(scale)))
    }
}

impl TaskStrategy for PublishVideoStrategy {
    fn name(&self) -> &'static str {
        "publish_video"
    }

    fn run(&self, invocation: StrategyInvocation) -> StrategyResult<JsonMap> {
        let params = &invocation.params;
        let username = param_str(params, "username");
        let password = param_str(params, "password");
        let video_path = param_str(params, "video_path");

        let (Some(username), Some(_password), Some(video_path)) = (username, password, video_path)
        else {
            return Ok(business_error(
                "missing 'username' | 'password' | 'video_path'",
            ));
        };
        let username = username.to_string();
        let video_path = video_path.to_string();
        let title = param_str(params, "title").map(str::to_string);
        let description = param_str(params, "description").map(str::to_string);
        let token = &invocation.cancellation;

        // Phase 1: login.
        std::thread::sleep(self.timing.login);
        if token.is_cancelled() {
            return Ok(cancelled_result(5));
        }

        // Phase 2: chunked upload, 3 to 5 chunks derived from the path.
        let total_chunks = 3 + video_path.len() % 3;
        for chunk in 1..=total_chunks {
            std::thread::sleep(self.timing.chunk);
            if token.is_cancelled() {
                let progress = 5 + chunk * 70 / total_chunks;
                return Ok(cancelled_result(progress));
            }
        }

        // Phase 3: audit, 1 or 2 steps derived from the username.
        let audit_steps = 1 + username.len() % 2;
        for step in 1..=audit_steps {
            std::thread::sleep(self.timing.audit_step);
            if token.is_cancelled() {
                let progress = 80 + step * 15 / audit_steps;
                return Ok(cancelled_result(progress));
            }
        }

        let published_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let video_id = format!("vid_{published_at}_{}", invocation.task_id);

        let mut result = JsonMap::new();
        result.insert("action".to_string(), Value::String("publish".to_string()));
        result.insert("username".to_string(), Value::String(username));
        result.insert("video_path".to_string(), Value::String(video_path));
        result.insert("video_id".to_string(), Value::String(video_id));
        result.insert("status".to_string(), Value::String("published".to_string()));
        result.insert("title".to_string(), title.map(Value::String).unwrap_or(Value::Null));
        result.insert(
            "description".to_string(),
            description.map(Value::String).unwrap_or(Value::Null),
        );
        Ok(result)
    }
}

fn cancelled_result(progress: usize) -> JsonMap {
    let mut result = JsonMap::new();
    result.insert("status".to_string(), Value::String("cancelled".to_string()));
    result.insert("progress".to_string(), Value::from(progress));
    result.insert(
        "message".to_string(),
        Value::String("cancel requested".to_string()),
    );
    result
}

fn invalid_time_scale(raw: &str) -> CoreError {
    CoreError {
        strategy: Some("publish_video".to_string()),
        task: None,
        kind: CoreErrorKind::InvalidInput,
        message: format!("{TIME_SCALE_ENV} must be a positive number, got '{raw}'"),
    }
}
