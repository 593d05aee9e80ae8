use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, response::Response, Json};

use restock_infra::store::ProductRepository;
use restock_infra::Store;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

use super::run_blocking;

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let listed = run_blocking(move || {
        let mut session = services
            .store
            .open()
            .map_err(errors::store_error_to_response)?;
        session.all_products().map_err(errors::store_error_to_response)
    })
    .await;

    match listed {
        Ok(products) => Json(dto::ProductListResponse {
            status: dto::success(),
            products,
        })
        .into_response(),
        Err(resp) => resp,
    }
}
