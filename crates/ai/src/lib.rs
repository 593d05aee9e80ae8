//! `restock-ai`
//!
//! **Responsibility:** time-series forecasting boundary.
//!
//! This crate stays storage-agnostic:
//! - It does not know about repositories, sessions or products.
//! - Inputs are plain date/quantity series provided by callers (infra engines).
//! - It returns forecast points; persisting them is the caller's job.

pub mod additive;
pub mod error;
mod linalg;
pub mod model;
pub mod series;
mod stats;

pub use additive::{AdditiveModel, AdditiveModelConfig, FittedAdditiveModel, SeasonalityMode};
pub use error::AiError;
pub use model::{ForecastModel, ForecastPoint};
pub use series::Series;
