use serde::{Deserialize, Serialize};

use restock_products::Product;
use restock_replenishment::{RecommendationRecord, RecommendationSummary};

#[derive(Debug, Clone, Deserialize)]
pub struct RunForecastQuery {
    /// Forecast horizon in days; the configured default when absent.
    pub days_ahead: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub records_uploaded: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRunResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub recommendations: Vec<RecommendationSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationListResponse {
    pub status: String,
    pub recommendations: Vec<RecommendationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub status: String,
    pub products: Vec<Product>,
}

pub fn success() -> String {
    "success".to_string()
}
