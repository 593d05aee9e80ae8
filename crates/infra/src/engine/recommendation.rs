use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use restock_replenishment::ReorderPolicy;

use super::lock::RunLock;
use super::report::{RecommendationOutcome, RecommendationReport};
use super::{rollback_quietly, EngineError};
use crate::store::{Session, Store};

/// Batch job: turn every product's stored forecasts into a reorder
/// recommendation. The whole run is one unit of work.
pub struct RecommendationEngine<S> {
    store: S,
    policy: ReorderPolicy,
    lock: RunLock,
}

impl<S: Store> RecommendationEngine<S> {
    pub fn new(store: S, policy: ReorderPolicy) -> Result<Self, EngineError> {
        policy.validate()?;
        Ok(Self {
            store,
            policy,
            lock: RunLock::new("recommendation"),
        })
    }

    pub fn is_running(&self) -> bool {
        self.lock.is_held()
    }

    pub fn run_recommendations(&self) -> Result<RecommendationOutcome, EngineError> {
        self.run_recommendations_at(Utc::now())
    }

    /// Run as of `now`; `valid_until` is counted from `now`'s UTC date.
    #[instrument(skip(self, now), err)]
    pub fn run_recommendations_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<RecommendationOutcome, EngineError> {
        let _guard = self.lock.try_acquire()?;

        let run_id = Uuid::now_v7();
        let mut session = self.store.open()?;

        match self.plan_all(session.as_mut(), run_id, now) {
            Ok(outcome) => Ok(outcome),
            Err(err) => Err(rollback_quietly(session.as_mut(), err)),
        }
    }

    fn plan_all(
        &self,
        session: &mut dyn Session,
        run_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RecommendationOutcome, EngineError> {
        let products = session.all_products()?;
        if products.is_empty() {
            info!(%run_id, "no product data; nothing to recommend");
            return Ok(RecommendationOutcome::NoProductData);
        }

        let today = now.date_naive();
        let mut recommendations = Vec::new();

        for product in &products {
            let forecasts = session.forecasts_for(&product.product_id)?;
            let plan = match self.policy.evaluate(product, &forecasts, today) {
                Ok(Some(plan)) => plan,
                Ok(None) => {
                    debug!(%run_id, product_id = %product.product_id, "no forecasts; skipping product");
                    continue;
                }
                Err(err) => {
                    warn!(
                        %run_id,
                        product_id = %product.product_id,
                        error = %err,
                        "cannot derive a recommendation; skipping product"
                    );
                    continue;
                }
            };

            session.append_recommendation(plan.to_record(now))?;
            info!(
                %run_id,
                product_id = %plan.product_id,
                forecast_rows = forecasts.len(),
                recommended_qty = plan.recommended_qty,
                lead_time_days = plan.lead_time_days,
                "recommendation staged"
            );
            recommendations.push(plan.summary());
        }

        if recommendations.is_empty() {
            info!(%run_id, products = products.len(), "no product had forecasts");
            return Ok(RecommendationOutcome::NoRecommendations);
        }

        session.commit()?;
        info!(%run_id, recommendations = recommendations.len(), "recommendation run committed");

        Ok(RecommendationOutcome::Completed(RecommendationReport {
            run_id,
            created_at: now,
            recommendations,
        }))
    }
}
