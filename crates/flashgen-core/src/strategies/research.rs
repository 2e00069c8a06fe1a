use serde_json::Value;

use crate::models::JsonMap;
use crate::strategies::{
    StrategyInvocation, StrategyResult, TaskStrategy, business_error, param_str, simulated_delay,
};

#[derive(Debug)]
pub struct ResearchStrategy;

impl TaskStrategy for ResearchStrategy {
    fn name(&self) -> &'static str {
        "research"
    }

    fn run(&self, invocation: StrategyInvocation) -> StrategyResult<JsonMap> {
        let params = &invocation.params;
        let Some(topic) = param_str(params, "topic").or_else(|| param_str(params, "query")) else {
            return Ok(business_error("missing 'topic' in params"));
        };
        let topic = topic.to_string();

        simulated_delay(params);

        let mut result = JsonMap::new();
        result.insert("type".to_string(), Value::String("research".to_string()));
        result.insert("topic".to_string(), Value::String(topic.clone()));
        result.insert(
            "summary".to_string(),
            Value::String(format!("Research summary about {topic}")),
        );
        Ok(result)
    }
}
