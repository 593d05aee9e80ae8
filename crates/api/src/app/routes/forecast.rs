use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

use super::run_blocking;

pub async fn run_forecast(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::RunForecastQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            return errors::json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                rejection.body_text(),
            );
        }
    };
    let outcome = run_blocking(move || {
        let engine = &services.forecast;
        match query.days_ahead {
            Some(days_ahead) => engine.run_forecast(days_ahead),
            None => engine.run_default(),
        }
        .map_err(errors::engine_error_to_response)
    })
    .await;

    match outcome {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "result": outcome,
            })),
        )
            .into_response(),
        Err(resp) => resp,
    }
}
