use serde_json::Value;

use crate::models::JsonMap;
use crate::strategies::{
    StrategyInvocation, StrategyResult, TaskStrategy, business_error, param_str, simulated_delay,
};

const DEFAULT_LANGUAGE: &str = "python";

#[derive(Debug)]
pub struct CodeStrategy;

impl TaskStrategy for CodeStrategy {
    fn name(&self) -> &'static str {
        "code"
    }

    fn run(&self, invocation: StrategyInvocation) -> StrategyResult<JsonMap> {
        let params = &invocation.params;
        let Some(instruction) =
            param_str(params, "instruction").or_else(|| param_str(params, "prompt"))
        else {
            return Ok(business_error("missing 'instruction' in params"));
        };
        let instruction = instruction.to_string();
        let language = param_str(params, "language")
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();

        simulated_delay(params);

        let mut result = JsonMap::new();
        result.insert("type".to_string(), Value::String("code".to_string()));
        result.insert("language".to_string(), Value::String(language.clone()));
        result.insert(
            "code".to_string(),
            Value::String(format!("# Generated {language} code for: {instruction}")),
        );
        Ok(result)
    }
}
