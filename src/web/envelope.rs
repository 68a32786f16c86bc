use serde::{Deserialize, Serialize};

/// Uniform response body: `{ success, data?, error? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Body returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedRecord {
    pub id: String,
    pub deleted: bool,
}

impl DeletedRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            deleted: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_omits_error() {
        let value = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(value, json!({"success": true, "data": [1, 2]}));
    }

    #[test]
    fn empty_list_is_still_data() {
        let value = serde_json::to_value(ApiResponse::ok(Vec::<u8>::new())).unwrap();
        assert_eq!(value, json!({"success": true, "data": []}));
    }

    #[test]
    fn failure_envelope_omits_data() {
        let value = serde_json::to_value(ApiResponse::<()>::failure("nope")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "nope"}));
    }

    #[test]
    fn deleted_record_shape() {
        let value = serde_json::to_value(ApiResponse::ok(DeletedRecord::new("p1"))).unwrap();
        assert_eq!(
            value,
            json!({"success": true, "data": {"id": "p1", "deleted": true}})
        );
    }
}
