use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::series::Series;

/// One predicted future step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Point forecast.
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

impl ForecastPoint {
    /// Width of the prediction interval (`upper - lower`, never negative).
    pub fn interval_width(&self) -> f64 {
        (self.yhat_upper - self.yhat_lower).max(0.0)
    }
}

/// A forecasting method that can be fitted on a series and extended into the future.
///
/// Implementations must be deterministic and must not perform IO.
pub trait ForecastModel: Send + Sync {
    /// Stable tag persisted alongside every forecast row.
    fn tag(&self) -> &str;

    /// Fit on the full `series` and return exactly `horizon_days` future
    /// points, one per day after the last observed date.
    fn forecast(&self, series: &Series, horizon_days: u32) -> Result<Vec<ForecastPoint>, AiError>;
}
