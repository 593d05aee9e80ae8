use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use restock_core::ProductId;

/// One stored forecast step.
///
/// `confidence` is the width of the prediction interval (upper - lower), not a
/// probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub product_id: ProductId,
    pub forecast_date: NaiveDate,
    pub predicted_demand: f64,
    pub confidence: f64,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
}

/// A stored reorder recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub product_id: ProductId,
    pub recommended_qty: f64,
    pub confidence: f64,
    pub reason: String,
    pub valid_until: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Per-product line of a recommendation run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub product_id: ProductId,
    pub forecasted_demand: f64,
    pub recommended_qty: f64,
    pub confidence: f64,
}
