use serde_json::Value;

use crate::models::JsonMap;
use crate::strategies::{
    StrategyInvocation, StrategyResult, TaskStrategy, business_error, param_str, simulated_delay,
};

const DEFAULT_STYLE: &str = "professional";

#[derive(Debug)]
pub struct RewriteStrategy;

impl TaskStrategy for RewriteStrategy {
    fn name(&self) -> &'static str {
        "rewrite"
    }

    fn run(&self, invocation: StrategyInvocation) -> StrategyResult<JsonMap> {
        let params = &invocation.params;
        let Some(original) = param_str(params, "text") else {
            return Ok(business_error("missing 'text'"));
        };
        let original = original.to_string();

        let styles: Vec<String> = params
            .get("styles")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .filter(|styles: &Vec<String>| !styles.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_STYLE.to_string()]);

        let tone = param_str(params, "tone").map(str::to_string);
        let extra = param_str(params, "extra_instructions").map(str::to_string);

        simulated_delay(params);

        let rewrites: Vec<Value> = styles
            .iter()
            .map(|style| {
                let mut rewrite = JsonMap::new();
                rewrite.insert("style".to_string(), Value::String(style.clone()));
                rewrite.insert(
                    "content".to_string(),
                    Value::String(render_rewrite(&original, style, tone.as_deref(), extra.as_deref())),
                );
                Value::Object(rewrite)
            })
            .collect();

        let mut result = JsonMap::new();
        result.insert("original".to_string(), Value::String(original));
        result.insert("rewrites".to_string(), Value::Array(rewrites));
        Ok(result)
    }
}

fn render_rewrite(original: &str, style: &str, tone: Option<&str>, extra: Option<&str>) -> String {
    let mut content = format!("[{style}] {original}");
    if let Some(tone) = tone {
        content.push_str(&format!(" (tone: {tone})"));
    }
    if let Some(extra) = extra {
        content.push_str(&format!(" (note: {extra})"));
    }
    content
}
