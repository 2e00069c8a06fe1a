use serde_json::Value;

use crate::models::JsonMap;
use crate::strategies::{
    StrategyInvocation, StrategyResult, TaskStrategy, business_error, simulated_delay,
};

const SUMMARY_LIMIT_CHARS: usize = 300;

#[derive(Debug)]
pub struct SummarizeStrategy;

impl TaskStrategy for SummarizeStrategy {
    fn name(&self) -> &'static str {
        "summarize"
    }

    fn run(&self, invocation: StrategyInvocation) -> StrategyResult<JsonMap> {
        let params = &invocation.params;
        let texts: Vec<&str> = params
            .get("texts")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        if texts.is_empty() {
            return Ok(business_error("missing 'texts' list in params"));
        }

        simulated_delay(params);

        let merged = texts.join(" ");
        let summary: String = if merged.chars().count() > SUMMARY_LIMIT_CHARS {
            let truncated: String = merged.chars().take(SUMMARY_LIMIT_CHARS).collect();
            format!("{truncated}...")
        } else {
            merged
        };

        let mut result = JsonMap::new();
        result.insert("type".to_string(), Value::String("summarize".to_string()));
        result.insert("summary".to_string(), Value::String(summary));
        result.insert("count".to_string(), Value::from(texts.len()));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskId;
    use crate::orchestration::TaskCancellationToken;

    fn invocation(params: JsonMap) -> StrategyInvocation {
        StrategyInvocation {
            task_id: TaskId::from("t-summarize"),
            params,
            cancellation: TaskCancellationToken::new(),
        }
    }

    fn params_with_texts(texts: &[&str]) -> JsonMap {
        let mut params = JsonMap::new();
        params.insert(
            "texts".to_string(),
            Value::Array(texts.iter().map(|t| Value::String(t.to_string())).collect()),
        );
        params
    }

    #[test]
    fn empty_texts_are_reported_as_data() {
        let result = SummarizeStrategy
            .run(invocation(params_with_texts(&[])))
            .unwrap();
        assert!(result.contains_key("error"));
    }

    #[test]
    fn short_input_is_kept_verbatim() {
        let result = SummarizeStrategy
            .run(invocation(params_with_texts(&["one", "two"])))
            .unwrap();
        assert_eq!(result.get("summary").and_then(Value::as_str), Some("one two"));
        assert_eq!(result.get("count").and_then(Value::as_u64), Some(2));
    }

    #[test]
    fn long_input_is_truncated_with_ellipsis() {
        let long = "x".repeat(500);
        let result = SummarizeStrategy
            .run(invocation(params_with_texts(&[&long])))
            .unwrap();
        let summary = result.get("summary").and_then(Value::as_str).unwrap();
        assert_eq!(summary.chars().count(), SUMMARY_LIMIT_CHARS + 3);
        assert!(summary.ends_with("..."));
    }
}
