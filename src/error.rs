use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch job fair data";
pub const INVALID_DATE_MESSAGE: &str = "Invalid date parameter";

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid {param} `{value}`: expected an ISO-8601 date")]
    InvalidDate { param: &'static str, value: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        match self {
            DashboardError::InvalidDate { .. } => {
                tracing::warn!(error = %self, "rejected job fair request");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": INVALID_DATE_MESSAGE })),
                )
                    .into_response()
            }
            DashboardError::Database(ref err) => {
                // store details stay in the logs
                tracing::error!(error = %err, "job fair aggregation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": FETCH_FAILED_MESSAGE })),
                )
                    .into_response()
            }
        }
    }
}
