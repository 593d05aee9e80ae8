use axum::{
    response::Response,
    routing::{get, post},
    Router,
};

use crate::app::errors;

pub mod forecast;
pub mod products;
pub mod recommendations;
pub mod sales;
pub mod system;

/// Router for the planning endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/forecast/run", post(forecast::run_forecast))
        .route("/recommendations/run", post(recommendations::run_recommendations))
        .route("/recommendations", get(recommendations::list_recommendations))
        .route("/products", get(products::list_products))
        .route("/upload", post(sales::upload_sales))
}

/// Run store-bound work on the blocking pool. Engines and sessions are
/// synchronous and must not run on an async worker.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, Response> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(errors::join_error_to_response(e)),
    }
}
