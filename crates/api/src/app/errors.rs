use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use restock_infra::{EngineError, StoreError};
use restock_sales::IngestError;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::InvalidHorizon { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", err.to_string())
        }
        EngineError::RunInProgress(_) => json_error(StatusCode::CONFLICT, "run_in_progress", err.to_string()),
        EngineError::ModelFit { .. } => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "model_fit_failed", err.to_string())
        }
        EngineError::Store(e) => store_error_to_response(e),
        EngineError::Domain(e) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", e.to_string())
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Unavailable(msg) => json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg),
        other => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", other.to_string()),
    }
}

pub fn ingest_error_to_response(err: IngestError) -> axum::response::Response {
    match err {
        IngestError::MissingColumns(_) => json_error(StatusCode::BAD_REQUEST, "missing_columns", err.to_string()),
        IngestError::InvalidValue { .. } | IngestError::Csv(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_csv", err.to_string())
        }
    }
}

/// A blocking task panicked or was cancelled.
pub fn join_error_to_response(err: tokio::task::JoinError) -> axum::response::Response {
    tracing::error!(error = %err, "blocking task failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "background task failed")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
