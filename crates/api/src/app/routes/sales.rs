use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    response::{IntoResponse, Response},
    Json,
};

use restock_infra::store::{SalesRepository, Session};
use restock_infra::Store;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

use super::run_blocking;

/// Append an uploaded CSV of sales rows. The whole file is one transaction.
pub async fn upload_sales(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> Response {
    let records = match restock_sales::parse_csv(&body) {
        Ok(r) => r,
        Err(e) => return errors::ingest_error_to_response(e),
    };

    let uploaded = run_blocking(move || {
        let mut session = services
            .store
            .open()
            .map_err(errors::store_error_to_response)?;
        let n = session
            .append_sales(records)
            .map_err(errors::store_error_to_response)?;
        session.commit().map_err(errors::store_error_to_response)?;
        Ok(n)
    })
    .await;

    match uploaded {
        Ok(n) => {
            tracing::info!(rows = n, "sales upload committed");
            Json(dto::UploadResponse {
                status: dto::success(),
                records_uploaded: n,
            })
            .into_response()
        }
        Err(resp) => resp,
    }
}
