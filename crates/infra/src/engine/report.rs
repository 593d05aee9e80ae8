use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use restock_core::ProductId;
use restock_replenishment::RecommendationSummary;

/// What happened to one product during a forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProductOutcome {
    /// Forecast rows were written and committed.
    Forecasted { product_id: ProductId, rows: usize },
    /// Too few usable observations to fit a model.
    Skipped {
        product_id: ProductId,
        valid_points: usize,
    },
    /// Model failure tolerated under [`FailurePolicy::Skip`](super::FailurePolicy::Skip).
    Failed { product_id: ProductId, reason: String },
}

impl ProductOutcome {
    pub fn product_id(&self) -> &ProductId {
        match self {
            ProductOutcome::Forecasted { product_id, .. }
            | ProductOutcome::Skipped { product_id, .. }
            | ProductOutcome::Failed { product_id, .. } => product_id,
        }
    }
}

/// Batch report of one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub run_id: Uuid,
    pub horizon_days: u32,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
    /// Per-product outcomes, ordered by product id.
    pub products: Vec<ProductOutcome>,
}

impl ForecastReport {
    /// `(product_id, rows)` for every forecasted product.
    pub fn forecasted(&self) -> impl Iterator<Item = (&ProductId, usize)> {
        self.products.iter().filter_map(|p| match p {
            ProductOutcome::Forecasted { product_id, rows } => Some((product_id, *rows)),
            _ => None,
        })
    }

    pub fn rows_written(&self) -> usize {
        self.forecasted().map(|(_, rows)| rows).sum()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ProductOutcome> {
        self.products
            .iter()
            .filter(|p| matches!(p, ProductOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProductOutcome> {
        self.products
            .iter()
            .filter(|p| matches!(p, ProductOutcome::Failed { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ForecastOutcome {
    /// The sales table is empty.
    NoSalesData,
    /// No product had enough history; the report lists the skips.
    InsufficientData(ForecastReport),
    Completed(ForecastReport),
}

/// Batch report of one recommendation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub recommendations: Vec<RecommendationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecommendationOutcome {
    /// The product catalog is empty.
    NoProductData,
    /// No product had any forecast rows.
    NoRecommendations,
    Completed(RecommendationReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    #[test]
    fn report_totals_only_count_forecasted_products() {
        let report = ForecastReport {
            run_id: Uuid::now_v7(),
            horizon_days: 14,
            model_used: "additive".to_string(),
            created_at: Utc::now(),
            products: vec![
                ProductOutcome::Forecasted {
                    product_id: pid("A"),
                    rows: 14,
                },
                ProductOutcome::Skipped {
                    product_id: pid("B"),
                    valid_points: 2,
                },
                ProductOutcome::Forecasted {
                    product_id: pid("C"),
                    rows: 14,
                },
            ],
        };
        assert_eq!(report.rows_written(), 28);
        assert_eq!(report.skipped().count(), 1);
        assert_eq!(report.failed().count(), 0);
    }

    #[test]
    fn outcomes_serialize_with_status_tags() {
        let json = serde_json::to_value(ProductOutcome::Skipped {
            product_id: pid("B"),
            valid_points: 2,
        })
        .unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["product_id"], "B");

        let json = serde_json::to_value(ForecastOutcome::NoSalesData).unwrap();
        assert_eq!(json["outcome"], "no_sales_data");
    }
}
