use serde::Serialize;

/// Uniform response envelope: `{"code": 200, "message": "success", "data": ...}`.
#[derive(Clone, Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_shape() {
        let envelope = ApiResponse::success(json!({"task_id": "t1"}));
        let rendered = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            rendered,
            json!({"code": 200, "message": "success", "data": {"task_id": "t1"}})
        );
    }

    #[test]
    fn failure_envelope_carries_null_data() {
        let envelope = ApiResponse::failure(404, "task 'x' not found");
        let rendered = serde_json::to_value(&envelope).unwrap();
        assert_eq!(rendered["code"], 404);
        assert_eq!(rendered["data"], serde_json::Value::Null);
    }
}
