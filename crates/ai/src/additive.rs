//! Additive trend + seasonality model with a prediction interval.
//!
//! Model:
//! - `y(t) = level + slope * t + Σ seasonal_k(t) + noise`
//! - Seasonal components are Fourier series (daily, weekly, yearly periods).
//! - Coefficients come from least squares with a ridge prior on seasonal terms,
//!   so short histories with many seasonal terms stay solvable.
//! - The interval combines residual noise with a drift term that grows with
//!   the forecast step.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AiError;
use crate::linalg;
use crate::model::{ForecastModel, ForecastPoint};
use crate::series::Series;
use crate::stats::normal_quantile;

/// Whether a seasonal component is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    /// Enabled when the history is long enough to observe the cycle twice.
    Auto,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveModelConfig {
    /// Coverage of the prediction interval, in `(0, 1)`.
    pub interval_width: f64,
    pub daily_seasonality: SeasonalityMode,
    pub weekly_seasonality: SeasonalityMode,
    pub yearly_seasonality: SeasonalityMode,
    /// Prior scale of seasonal coefficients (larger = less shrinkage).
    pub seasonality_prior_scale: f64,
}

impl Default for AdditiveModelConfig {
    fn default() -> Self {
        Self {
            interval_width: 0.8,
            daily_seasonality: SeasonalityMode::Enabled,
            weekly_seasonality: SeasonalityMode::Auto,
            yearly_seasonality: SeasonalityMode::Auto,
            seasonality_prior_scale: 10.0,
        }
    }
}

impl AdditiveModelConfig {
    pub fn with_interval_width(mut self, interval_width: f64) -> Self {
        self.interval_width = interval_width;
        self
    }

    pub fn with_daily_seasonality(mut self, mode: SeasonalityMode) -> Self {
        self.daily_seasonality = mode;
        self
    }

    pub fn with_weekly_seasonality(mut self, mode: SeasonalityMode) -> Self {
        self.weekly_seasonality = mode;
        self
    }

    pub fn with_yearly_seasonality(mut self, mode: SeasonalityMode) -> Self {
        self.yearly_seasonality = mode;
        self
    }

    pub fn validate(&self) -> Result<(), AiError> {
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(AiError::InvalidConfig(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        if !(self.seasonality_prior_scale.is_finite() && self.seasonality_prior_scale > 0.0) {
            return Err(AiError::InvalidConfig(
                "seasonality_prior_scale must be a finite positive number".to_string(),
            ));
        }
        Ok(())
    }
}

struct Seasonality {
    name: &'static str,
    period_days: f64,
    order: usize,
    /// Minimum history span for `Auto`; `None` means `Auto` never enables it.
    auto_min_span_days: Option<i64>,
}

// Daily cycles are invisible in date-granular history, so `Auto` leaves them off.
const DAILY: Seasonality = Seasonality {
    name: "daily",
    period_days: 1.0,
    order: 4,
    auto_min_span_days: None,
};

const WEEKLY: Seasonality = Seasonality {
    name: "weekly",
    period_days: 7.0,
    order: 3,
    auto_min_span_days: Some(14),
};

const YEARLY: Seasonality = Seasonality {
    name: "yearly",
    period_days: 365.25,
    order: 10,
    auto_min_span_days: Some(730),
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Term {
    Intercept,
    Trend,
    Fourier {
        source: &'static str,
        period_days: f64,
        k: usize,
        cosine: bool,
    },
}

impl Term {
    fn eval(&self, t_days: f64, trend_scale: f64) -> f64 {
        match *self {
            Term::Intercept => 1.0,
            Term::Trend => t_days / trend_scale,
            Term::Fourier {
                period_days,
                k,
                cosine,
                ..
            } => {
                let angle = 2.0 * std::f64::consts::PI * (k as f64) * t_days / period_days;
                if cosine { angle.cos() } else { angle.sin() }
            }
        }
    }

    fn penalized(&self) -> bool {
        matches!(self, Term::Fourier { .. })
    }
}

/// Unfitted additive model (configuration only).
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    config: AdditiveModelConfig,
}

impl AdditiveModel {
    pub const TAG: &'static str = "additive";

    pub fn new(config: AdditiveModelConfig) -> Result<Self, AiError> {
        config.validate()?;
        Ok(Self { config })
    }

    fn candidate_terms(&self, span_days: i64) -> Vec<Term> {
        let mut terms = vec![Term::Intercept, Term::Trend];
        let seasonalities = [
            (&DAILY, self.config.daily_seasonality),
            (&WEEKLY, self.config.weekly_seasonality),
            (&YEARLY, self.config.yearly_seasonality),
        ];
        for (s, mode) in seasonalities {
            let enabled = match mode {
                SeasonalityMode::Enabled => true,
                SeasonalityMode::Disabled => false,
                SeasonalityMode::Auto => s.auto_min_span_days.is_some_and(|m| span_days >= m),
            };
            if !enabled {
                continue;
            }
            for k in 1..=s.order {
                for cosine in [false, true] {
                    terms.push(Term::Fourier {
                        source: s.name,
                        period_days: s.period_days,
                        k,
                        cosine,
                    });
                }
            }
        }
        terms
    }

    /// Fit on the full history.
    pub fn fit(&self, series: &Series) -> Result<FittedAdditiveModel, AiError> {
        let n = series.len();
        if n < 2 {
            return Err(AiError::InvalidInput(format!(
                "at least 2 observations are required, got {n}"
            )));
        }
        let (origin, last_date) = match (series.first_date(), series.last_date()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(AiError::InvalidInput("empty series".to_string())),
        };

        let span_days = series.span_days();
        let trend_scale = (span_days as f64).max(1.0);
        let y_scale = series
            .points()
            .iter()
            .fold(0.0_f64, |m, (_, y)| m.max(y.abs()));
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let ts: Vec<f64> = series
            .points()
            .iter()
            .map(|(d, _)| (*d - origin).num_days() as f64)
            .collect();
        let ys: Vec<f64> = series.points().iter().map(|(_, y)| y / y_scale).collect();

        // Drop terms that are constant over the history: they cannot be told apart
        // from the level (e.g. daily cycles sampled once per day, trend over one date).
        let terms: Vec<Term> = self
            .candidate_terms(span_days)
            .into_iter()
            .filter(|term| {
                if *term == Term::Intercept {
                    return true;
                }
                let (lo, hi) = ts.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
                    let v = term.eval(*t, trend_scale);
                    (lo.min(v), hi.max(v))
                });
                hi - lo > 1e-8
            })
            .collect();

        let p = terms.len();
        let rows: Vec<Vec<f64>> = ts
            .iter()
            .map(|t| terms.iter().map(|term| term.eval(*t, trend_scale)).collect())
            .collect();

        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for (row, y) in rows.iter().zip(&ys) {
            for i in 0..p {
                xty[i] += row[i] * y;
                for j in 0..p {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }
        let ridge = 1.0 / (self.config.seasonality_prior_scale * self.config.seasonality_prior_scale);
        for (i, term) in terms.iter().enumerate() {
            if term.penalized() {
                xtx[i][i] += ridge;
            }
        }

        let coefficients = linalg::solve(xtx, xty)
            .ok_or_else(|| AiError::FitFailed("design matrix is singular".to_string()))?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AiError::FitFailed("non-finite model coefficients".to_string()));
        }

        let ssr: f64 = rows
            .iter()
            .zip(&ys)
            .map(|(row, y)| {
                let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
                (y - fitted).powi(2)
            })
            .sum();
        let unpenalized = terms.iter().filter(|t| !t.penalized()).count();
        let dof = n.saturating_sub(unpenalized).max(1) as f64;
        let sigma = (ssr / dof).sqrt() * y_scale;

        let mut seasonalities: Vec<&'static str> = terms
            .iter()
            .filter_map(|t| match t {
                Term::Fourier { source, .. } => Some(*source),
                _ => None,
            })
            .collect();
        seasonalities.dedup();

        debug!(
            observations = n,
            span_days,
            terms = p,
            sigma,
            seasonalities = ?seasonalities,
            "additive model fitted"
        );

        Ok(FittedAdditiveModel {
            origin,
            last_date,
            trend_scale,
            y_scale,
            terms,
            coefficients,
            sigma,
            observations: n,
            z: normal_quantile(0.5 + self.config.interval_width / 2.0),
            seasonalities,
        })
    }
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self {
            config: AdditiveModelConfig::default(),
        }
    }
}

/// A fitted model ready to extend the series.
#[derive(Debug, Clone)]
pub struct FittedAdditiveModel {
    origin: NaiveDate,
    last_date: NaiveDate,
    trend_scale: f64,
    y_scale: f64,
    terms: Vec<Term>,
    coefficients: Vec<f64>,
    sigma: f64,
    observations: usize,
    z: f64,
    seasonalities: Vec<&'static str>,
}

impl FittedAdditiveModel {
    /// Residual standard deviation in the units of the input series.
    pub fn residual_sigma(&self) -> f64 {
        self.sigma
    }

    /// Names of the seasonal components that ended up in the model.
    pub fn seasonalities(&self) -> &[&'static str] {
        &self.seasonalities
    }

    /// Point estimate at an arbitrary date.
    pub fn estimate(&self, date: NaiveDate) -> f64 {
        let t = (date - self.origin).num_days() as f64;
        let scaled: f64 = self
            .terms
            .iter()
            .zip(&self.coefficients)
            .map(|(term, b)| term.eval(t, self.trend_scale) * b)
            .sum();
        scaled * self.y_scale
    }

    /// Predict `horizon_days` daily steps after the last observed date.
    pub fn predict(&self, horizon_days: u32) -> Result<Vec<ForecastPoint>, AiError> {
        let n = self.observations as f64;
        (1..=horizon_days)
            .map(|h| {
                let date = self
                    .last_date
                    .checked_add_days(Days::new(u64::from(h)))
                    .ok_or_else(|| AiError::InvalidInput("forecast date out of range".to_string()))?;
                let yhat = self.estimate(date);
                let half = self.z * self.sigma * (1.0 + 1.0 / n + f64::from(h) / n).sqrt();
                Ok(ForecastPoint {
                    date,
                    yhat,
                    yhat_lower: yhat - half,
                    yhat_upper: yhat + half,
                })
            })
            .collect()
    }
}

impl ForecastModel for AdditiveModel {
    fn tag(&self) -> &str {
        Self::TAG
    }

    fn forecast(&self, series: &Series, horizon_days: u32) -> Result<Vec<ForecastPoint>, AiError> {
        self.fit(series)?.predict(horizon_days)
    }
}
