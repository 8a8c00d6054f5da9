//! Standard response envelope: `{ success, data | error }`.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::store::DocumentId;

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn failure(message: String, code: &str) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(message),
            code: Some(code.to_string()),
        }
    }
}

/// Payload returned by create, update and delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdBody {
    pub id: DocumentId,
}

pub fn success_ok<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::success(data)))
}

pub fn success_created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::success(data)))
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<Envelope<Vec<T>>>) {
    (StatusCode::OK, Json(Envelope::success(data)))
}
