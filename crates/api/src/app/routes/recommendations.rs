use std::sync::Arc;

use axum::{extract::Extension, response::Response, Json};
use axum::response::IntoResponse;

use restock_infra::store::RecommendationRepository;
use restock_infra::Store;
use restock_infra::RecommendationOutcome;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

use super::run_blocking;

pub async fn run_recommendations(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let outcome = run_blocking(move || {
        services
            .recommend
            .run_recommendations()
            .map_err(errors::engine_error_to_response)
    })
    .await;

    let body = match outcome {
        Ok(RecommendationOutcome::Completed(report)) => dto::RecommendationRunResponse {
            status: dto::success(),
            run_id: Some(report.run_id.to_string()),
            message: None,
            recommendations: report.recommendations,
        },
        Ok(RecommendationOutcome::NoRecommendations) => dto::RecommendationRunResponse {
            status: dto::success(),
            run_id: None,
            message: Some("no forecasts available; nothing to recommend".to_string()),
            recommendations: Vec::new(),
        },
        Ok(RecommendationOutcome::NoProductData) => dto::RecommendationRunResponse {
            status: dto::success(),
            run_id: None,
            message: Some("no product data".to_string()),
            recommendations: Vec::new(),
        },
        Err(resp) => return resp,
    };
    Json(body).into_response()
}

pub async fn list_recommendations(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let listed = run_blocking(move || {
        let mut session = services
            .store
            .open()
            .map_err(errors::store_error_to_response)?;
        session
            .all_recommendations()
            .map_err(errors::store_error_to_response)
    })
    .await;

    match listed {
        Ok(recommendations) => Json(dto::RecommendationListResponse {
            status: dto::success(),
            recommendations,
        })
        .into_response(),
        Err(resp) => resp,
    }
}
