use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::models::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl<T> From<&Page<T>> for Pagination {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages(),
        }
    }
}

/// Success envelope: `{success: true, data?, message?, pagination?}`.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            pagination: None,
            status_code: StatusCode::OK,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::success(data).with_status(StatusCode::CREATED)
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl ApiResponse<Value> {
    /// Message-only response with no `data` member.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            pagination: None,
            status_code: StatusCode::OK,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut envelope = json!({ "success": true });
        if let Some(data) = &self.data {
            envelope["data"] = serde_json::to_value(data)?;
        }
        if let Some(message) = &self.message {
            envelope["message"] = json!(message);
        }
        if let Some(pagination) = &self.pagination {
            envelope["pagination"] = serde_json::to_value(pagination)?;
        }
        Ok(envelope)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self.to_json() {
            Ok(envelope) => (self.status_code, Json(envelope)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "message": "Failed to serialize response data"
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// Envelope that carries only a message.
pub type MessageResponse = ApiResponse<Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_wraps_data() {
        let response = ApiResponse::success(json!({"id": 7}));
        assert_eq!(response.status_code, StatusCode::OK);
        assert_eq!(response.to_json().unwrap(), json!({"success": true, "data": {"id": 7}}));
    }

    #[test]
    fn created_carries_message() {
        let response = ApiResponse::created(json!({"id": 1})).with_message("Patient created");
        assert_eq!(response.status_code, StatusCode::CREATED);
        assert_eq!(response.to_json().unwrap()["message"], "Patient created");
    }

    #[test]
    fn message_only_omits_data() {
        let body = MessageResponse::message("Logged out").to_json().unwrap();
        assert_eq!(body, json!({"success": true, "message": "Logged out"}));
    }

    #[test]
    fn pagination_from_page() {
        let page = Page { items: vec![1, 2], total: 21, page: 2, limit: 10 };
        let body = ApiResponse::success(&page.items)
            .with_pagination(Pagination::from(&page))
            .to_json()
            .unwrap();
        assert_eq!(body["pagination"], json!({"page": 2, "limit": 10, "total": 21, "pages": 3}));
        assert_eq!(body["data"], json!([1, 2]));
    }
}
