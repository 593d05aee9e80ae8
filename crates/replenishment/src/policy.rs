use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use restock_core::{DomainError, DomainResult, ProductId};
use restock_products::Product;

use crate::records::{ForecastRecord, RecommendationRecord, RecommendationSummary};

pub const DEFAULT_SAFETY_STOCK_PCT: f64 = 0.10;

/// Horizon the lead-time term is scaled against. Matches the forecaster's
/// default horizon; change both together.
pub const DEFAULT_REFERENCE_WINDOW_DAYS: u32 = 14;

/// Round half away from zero to two decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Reorder quantity policy:
///
/// `qty = T + T * safety_stock_pct + T * lead_time / reference_window_days`
///
/// where `T` is the sum of every stored forecast for the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderPolicy {
    pub safety_stock_pct: f64,
    pub reference_window_days: u32,
    /// Validity of a recommendation for products without a lead time.
    pub default_validity_days: u32,
}

impl Default for ReorderPolicy {
    fn default() -> Self {
        Self {
            safety_stock_pct: DEFAULT_SAFETY_STOCK_PCT,
            reference_window_days: DEFAULT_REFERENCE_WINDOW_DAYS,
            default_validity_days: 7,
        }
    }
}

/// Outcome of applying the policy to one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderPlan {
    pub product_id: ProductId,
    /// Unrounded sum of predicted demand.
    pub forecasted_demand: f64,
    pub recommended_qty: f64,
    pub confidence: f64,
    pub lead_time_days: u32,
    pub reason: String,
    pub valid_until: NaiveDate,
}

impl ReorderPolicy {
    pub fn validate(&self) -> DomainResult<()> {
        if !(self.safety_stock_pct.is_finite() && self.safety_stock_pct >= 0.0) {
            return Err(DomainError::validation(
                "safety_stock_pct must be a finite non-negative number",
            ));
        }
        if self.reference_window_days == 0 {
            return Err(DomainError::validation("reference_window_days must be > 0"));
        }
        Ok(())
    }

    /// Safety buffer as a whole percentage for display (`0.10` -> `10`).
    pub fn safety_stock_percent(&self) -> i64 {
        (self.safety_stock_pct * 100.0).round() as i64
    }

    /// Unrounded reorder quantity for a demand total and lead time.
    pub fn reorder_quantity(&self, total_forecast: f64, lead_time_days: u32) -> f64 {
        let safety_stock = total_forecast * self.safety_stock_pct;
        let lead_time_cover =
            total_forecast * (f64::from(lead_time_days) / f64::from(self.reference_window_days));
        (total_forecast + safety_stock + lead_time_cover).max(0.0)
    }

    /// Apply the policy to a product and all of its stored forecasts.
    ///
    /// Returns `Ok(None)` when there are no forecasts: nothing is derived from
    /// absent data.
    pub fn evaluate(
        &self,
        product: &Product,
        forecasts: &[ForecastRecord],
        today: NaiveDate,
    ) -> DomainResult<Option<ReorderPlan>> {
        if forecasts.is_empty() {
            return Ok(None);
        }

        let total_forecast: f64 = forecasts.iter().map(|f| f.predicted_demand).sum();
        let lead_time_days = product.effective_lead_time_days();
        let qty = self.reorder_quantity(total_forecast, lead_time_days);
        let confidence =
            forecasts.iter().map(|f| f.confidence).sum::<f64>() / forecasts.len() as f64;

        let validity = if lead_time_days > 0 {
            lead_time_days
        } else {
            self.default_validity_days
        };
        let valid_until = today
            .checked_add_days(Days::new(u64::from(validity)))
            .ok_or_else(|| DomainError::invariant(format!("valid_until overflows for {}", product.product_id)))?;

        Ok(Some(ReorderPlan {
            product_id: product.product_id.clone(),
            forecasted_demand: total_forecast,
            recommended_qty: round2(qty),
            confidence: round2(confidence),
            lead_time_days,
            reason: format!(
                "{lead_time_days}-day lead time, {}% safety buffer",
                self.safety_stock_percent()
            ),
            valid_until,
        }))
    }
}

impl ReorderPlan {
    pub fn to_record(&self, created_at: DateTime<Utc>) -> RecommendationRecord {
        RecommendationRecord {
            product_id: self.product_id.clone(),
            recommended_qty: self.recommended_qty,
            confidence: self.confidence,
            reason: self.reason.clone(),
            valid_until: self.valid_until,
            created_at,
        }
    }

    pub fn summary(&self) -> RecommendationSummary {
        RecommendationSummary {
            product_id: self.product_id.clone(),
            forecasted_demand: round2(self.forecasted_demand),
            recommended_qty: self.recommended_qty,
            confidence: self.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use restock_products::ProductType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn product(lead_time_days: Option<u32>) -> Product {
        Product {
            product_id: ProductId::parse("SKU_102").unwrap(),
            name: "Basmati Rice 1kg".to_string(),
            category: "Grocery".to_string(),
            product_type: ProductType::NonPerishable,
            shelf_life_days: 365,
            lead_time_days,
            supplier: "India Gate".to_string(),
        }
    }

    fn forecast(demand: f64, confidence: f64) -> ForecastRecord {
        ForecastRecord {
            product_id: ProductId::parse("SKU_102").unwrap(),
            forecast_date: today(),
            predicted_demand: demand,
            confidence,
            model_used: "additive".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_forecasts_yields_no_plan() {
        let plan = ReorderPolicy::default().evaluate(&product(Some(5)), &[], today()).unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn lead_time_scales_against_reference_window() {
        let forecasts = vec![forecast(40.0, 2.0), forecast(30.0, 4.0)];
        let plan = ReorderPolicy::default()
            .evaluate(&product(Some(7)), &forecasts, today())
            .unwrap()
            .unwrap();

        // 70 + 7 + 70 * 0.5
        assert_eq!(plan.recommended_qty, 112.0);
        assert_eq!(plan.confidence, 3.0);
        assert_eq!(plan.reason, "7-day lead time, 10% safety buffer");
        assert_eq!(plan.valid_until, today() + Days::new(7));
    }

    #[test]
    fn missing_lead_time_uses_default_validity() {
        let plan = ReorderPolicy::default()
            .evaluate(&product(None), &[forecast(10.0, 1.0)], today())
            .unwrap()
            .unwrap();
        assert_eq!(plan.lead_time_days, 0);
        assert_eq!(plan.recommended_qty, 11.0);
        assert_eq!(plan.reason, "0-day lead time, 10% safety buffer");
        assert_eq!(plan.valid_until, today() + Days::new(7));
    }

    #[test]
    fn results_are_rounded_to_two_decimals() {
        let plan = ReorderPolicy::default()
            .evaluate(&product(Some(3)), &[forecast(1.0 / 3.0, 1.0 / 3.0)], today())
            .unwrap()
            .unwrap();
        assert_eq!(plan.confidence, 0.33);
        assert_eq!(plan.recommended_qty, round2((1.0 / 3.0) * (1.1 + 3.0 / 14.0)));
        assert_eq!(plan.summary().forecasted_demand, 0.33);
    }

    #[test]
    fn negative_demand_never_recommends_negative_quantity() {
        let plan = ReorderPolicy::default()
            .evaluate(&product(Some(2)), &[forecast(-5.0, 1.0)], today())
            .unwrap()
            .unwrap();
        assert_eq!(plan.recommended_qty, 0.0);
        assert_eq!(plan.summary().forecasted_demand, -5.0);
    }

    #[test]
    fn injected_constants_change_the_formula() {
        let policy = ReorderPolicy {
            safety_stock_pct: 0.25,
            reference_window_days: 7,
            default_validity_days: 3,
        };
        let plan = policy
            .evaluate(&product(None), &[forecast(8.0, 0.0)], today())
            .unwrap()
            .unwrap();
        assert_eq!(plan.recommended_qty, 10.0);
        assert_eq!(plan.reason, "0-day lead time, 25% safety buffer");
        assert_eq!(plan.valid_until, today() + Days::new(3));
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let policy = ReorderPolicy {
            reference_window_days: 0,
            ..ReorderPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(DomainError::Validation(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: qty = T * (1 + 0.10 + L / 14), within two-decimal rounding.
        #[test]
        fn quantity_matches_closed_form(
            demands in prop::collection::vec(0.0f64..1_000.0, 1..30),
            lead in 0u32..60,
        ) {
            let forecasts: Vec<_> = demands.iter().map(|d| forecast(*d, 1.0)).collect();
            let plan = ReorderPolicy::default()
                .evaluate(&product(Some(lead)), &forecasts, today())
                .unwrap()
                .unwrap();
            let total: f64 = demands.iter().sum();
            let expected = total * (1.0 + 0.10 + f64::from(lead) / 14.0);
            prop_assert!((plan.recommended_qty - expected).abs() <= 0.005 + 1e-9 * expected.abs());
        }

        /// Property: valid_until is today + L when L > 0, otherwise today + 7.
        #[test]
        fn validity_follows_lead_time(lead in 0u32..90) {
            let plan = ReorderPolicy::default()
                .evaluate(&product(Some(lead)), &[forecast(1.0, 1.0)], today())
                .unwrap()
                .unwrap();
            let days = if lead > 0 { lead } else { 7 };
            prop_assert_eq!(plan.valid_until, today() + Days::new(u64::from(days)));
        }
    }
}
