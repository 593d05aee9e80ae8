use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use restock_ai::{AiError, ForecastModel, ForecastPoint, Series};
use restock_core::{DomainError, ProductId};
use restock_replenishment::ForecastRecord;
use restock_sales::SalesObservation;

use super::lock::RunLock;
use super::report::{ForecastOutcome, ForecastReport, ProductOutcome};
use super::{rollback_quietly, EngineError};
use crate::store::{SalesRepository, Session, Store};

pub const DEFAULT_HORIZON_DAYS: u32 = 14;
pub const MAX_HORIZON_DAYS: u32 = 60;
pub const MIN_HISTORY_POINTS: usize = 3;

/// What to do when the model fails on one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Roll back the product in flight and stop the run.
    #[default]
    Abort,
    /// Record the failure in the report and continue with the next product.
    Skip,
}

impl core::str::FromStr for FailurePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(DomainError::validation(format!(
                "unknown failure policy '{other}' (expected abort or skip)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSettings {
    pub default_horizon_days: u32,
    pub max_horizon_days: u32,
    /// Minimum usable observations before a product is modelled.
    pub min_history: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            default_horizon_days: DEFAULT_HORIZON_DAYS,
            max_horizon_days: MAX_HORIZON_DAYS,
            min_history: MIN_HISTORY_POINTS,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl ForecastSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_horizon_days == 0 {
            return Err(DomainError::validation("max_horizon_days must be > 0"));
        }
        if !(1..=self.max_horizon_days).contains(&self.default_horizon_days) {
            return Err(DomainError::validation(format!(
                "default_horizon_days must be between 1 and {}",
                self.max_horizon_days
            )));
        }
        if self.min_history < 2 {
            return Err(DomainError::validation("min_history must be at least 2"));
        }
        Ok(())
    }

    pub fn check_horizon(&self, horizon_days: u32) -> Result<(), EngineError> {
        if (1..=self.max_horizon_days).contains(&horizon_days) {
            Ok(())
        } else {
            Err(EngineError::InvalidHorizon {
                requested: horizon_days,
                max: self.max_horizon_days,
            })
        }
    }
}

/// Batch job: fit a model per product on its full sales history and persist
/// `horizon_days` future daily forecasts.
///
/// Each product is committed on its own, so a failure stops the run without
/// undoing products that already completed.
pub struct ForecastEngine<S> {
    store: S,
    model: Arc<dyn ForecastModel>,
    settings: ForecastSettings,
    lock: RunLock,
}

impl<S: Store> ForecastEngine<S> {
    pub fn new(
        store: S,
        model: Arc<dyn ForecastModel>,
        settings: ForecastSettings,
    ) -> Result<Self, EngineError> {
        settings.validate()?;
        Ok(Self {
            store,
            model,
            settings,
            lock: RunLock::new("forecast"),
        })
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.lock.is_held()
    }

    /// Run with the configured default horizon.
    pub fn run_default(&self) -> Result<ForecastOutcome, EngineError> {
        self.run_forecast(self.settings.default_horizon_days)
    }

    pub fn run_forecast(&self, horizon_days: u32) -> Result<ForecastOutcome, EngineError> {
        self.run_forecast_at(horizon_days, Utc::now())
    }

    /// Run with an explicit wall-clock timestamp stamped on every row.
    #[instrument(skip(self, now), fields(model = self.model.tag()), err)]
    pub fn run_forecast_at(
        &self,
        horizon_days: u32,
        now: DateTime<Utc>,
    ) -> Result<ForecastOutcome, EngineError> {
        self.settings.check_horizon(horizon_days)?;
        let _guard = self.lock.try_acquire()?;

        let run_id = Uuid::now_v7();
        let mut session = self.store.open()?;

        let sales = session.all_sales()?;
        if sales.is_empty() {
            info!(%run_id, "no sales data; nothing to forecast");
            return Ok(ForecastOutcome::NoSalesData);
        }

        let mut report = ForecastReport {
            run_id,
            horizon_days,
            model_used: self.model.tag().to_string(),
            created_at: now,
            products: Vec::new(),
        };

        for (product_id, points) in group_by_product(sales) {
            if points.len() < self.settings.min_history {
                info!(
                    %run_id,
                    product_id = %product_id,
                    valid_points = points.len(),
                    "insufficient history; skipping product"
                );
                report.products.push(ProductOutcome::Skipped {
                    product_id,
                    valid_points: points.len(),
                });
                continue;
            }

            let predicted = match self.predict(&product_id, points, horizon_days) {
                Ok(p) => p,
                Err(err) => match self.settings.failure_policy {
                    FailurePolicy::Abort => {
                        warn!(%run_id, product_id = %product_id, error = %err, "model failed; aborting run");
                        return Err(rollback_quietly(session.as_mut(), err));
                    }
                    FailurePolicy::Skip => {
                        warn!(%run_id, product_id = %product_id, error = %err, "model failed; skipping product");
                        report.products.push(ProductOutcome::Failed {
                            product_id,
                            reason: err.to_string(),
                        });
                        continue;
                    }
                },
            };

            let rows = self
                .persist(session.as_mut(), &product_id, &predicted, now)
                .map_err(|err| rollback_quietly(session.as_mut(), err))?;

            info!(%run_id, product_id = %product_id, rows, "forecast committed");
            report
                .products
                .push(ProductOutcome::Forecasted { product_id, rows });
        }

        if report.forecasted().next().is_none() && report.failed().next().is_none() {
            info!(%run_id, skipped = report.products.len(), "no product had enough history");
            return Ok(ForecastOutcome::InsufficientData(report));
        }

        info!(
            %run_id,
            products = report.forecasted().count(),
            rows = report.rows_written(),
            "forecast run completed"
        );
        Ok(ForecastOutcome::Completed(report))
    }

    fn predict(
        &self,
        product_id: &ProductId,
        points: Vec<(NaiveDate, f64)>,
        horizon_days: u32,
    ) -> Result<Vec<ForecastPoint>, EngineError> {
        let model_error = |source: AiError| EngineError::ModelFit {
            product_id: product_id.clone(),
            source,
        };

        let series = Series::new(points).map_err(model_error)?;
        let predicted = self
            .model
            .forecast(&series, horizon_days)
            .map_err(model_error)?;

        if predicted.len() != horizon_days as usize {
            return Err(model_error(AiError::FitFailed(format!(
                "expected {horizon_days} future steps, model returned {}",
                predicted.len()
            ))));
        }
        debug!(product_id = %product_id, observations = series.len(), "model fitted");
        Ok(predicted)
    }

    fn persist(
        &self,
        session: &mut dyn Session,
        product_id: &ProductId,
        predicted: &[ForecastPoint],
        now: DateTime<Utc>,
    ) -> Result<usize, EngineError> {
        for point in predicted {
            session.append_forecast(ForecastRecord {
                product_id: product_id.clone(),
                forecast_date: point.date,
                predicted_demand: point.yhat,
                confidence: point.interval_width(),
                model_used: self.model.tag().to_string(),
                created_at: now,
            })?;
        }
        session.commit()?;
        Ok(predicted.len())
    }
}

/// Group observations by product id, keeping only rows with both a date and a
/// quantity. Products whose rows are all unusable still appear with no points.
fn group_by_product(sales: Vec<SalesObservation>) -> BTreeMap<ProductId, Vec<(NaiveDate, f64)>> {
    let mut grouped: BTreeMap<ProductId, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for obs in sales {
        let point = obs.point();
        let entry = grouped.entry(obs.product_id).or_default();
        if let Some(p) = point {
            entry.push(p);
        }
    }
    grouped
}
