//! Standardized API response formats
//!
//! Every successful body is `{data, meta?}`.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A standardized API response wrapper for single resource responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// The response data
    pub data: T,
    /// Optional metadata about the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMetadata>,
}

/// Additional metadata about the response
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Optional additional metadata fields
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// A standardized API response wrapper for list/collection responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiListResponse<T> {
    /// The list of items
    pub data: Vec<T>,
    /// Optional metadata about the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMetadata>,
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl<T> IntoResponse for ApiListResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl<T> ApiResponse<T> {
    /// Create a new API response with just data
    pub fn new(data: T) -> Self {
        Self { data, meta: None }
    }

    /// Create a new API response with extra metadata fields
    pub fn with_extra(data: T, extra: serde_json::Value) -> Self {
        Self {
            data,
            meta: Some(ResponseMetadata { extra: Some(extra) }),
        }
    }
}

impl<T> ApiListResponse<T> {
    /// Create a new list response; `meta.count` carries the length
    pub fn new(data: Vec<T>) -> Self {
        let count = data.len();
        Self {
            data,
            meta: Some(ResponseMetadata {
                extra: Some(serde_json::json!({ "count": count })),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_carries_only_extra_fields() {
        let single = serde_json::to_value(ApiResponse::with_extra(1, json!({ "cash_balance": "700.00" }))).unwrap();
        assert_eq!(single, json!({ "data": 1, "meta": { "cash_balance": "700.00" } }));

        let list = serde_json::to_value(ApiListResponse::new(vec!["a", "b"])).unwrap();
        assert_eq!(list, json!({ "data": ["a", "b"], "meta": { "count": 2 } }));

        let bare = serde_json::to_value(ApiResponse::new("x")).unwrap();
        assert_eq!(bare, json!({ "data": "x" }));
    }
}
