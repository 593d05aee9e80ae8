use thiserror::Error;

use restock_ai::AiError;
use restock_core::{DomainError, ProductId};

use crate::store::StoreError;

/// Error surfaced by a planning run.
///
/// Short histories and empty inputs are *outcomes*, not errors; see
/// [`ForecastOutcome`](super::ForecastOutcome) and
/// [`RecommendationOutcome`](super::RecommendationOutcome).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("horizon must be between 1 and {max} days, got {requested}")]
    InvalidHorizon { requested: u32, max: u32 },

    #[error("a {0} run is already in progress")]
    RunInProgress(&'static str),

    #[error("model failed for product {product_id}: {source}")]
    ModelFit {
        product_id: ProductId,
        #[source]
        source: AiError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
