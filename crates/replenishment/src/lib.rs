//! Replenishment module.
//!
//! Forecast and recommendation records plus the reorder policy that turns a
//! product's stored forecasts into a reorder quantity. Pure logic: no IO, no
//! storage, no clock (callers pass `today`).

pub mod policy;
pub mod records;

pub use policy::{round2, ReorderPlan, ReorderPolicy, DEFAULT_REFERENCE_WINDOW_DAYS, DEFAULT_SAFETY_STOCK_PCT};
pub use records::{ForecastRecord, RecommendationRecord, RecommendationSummary};
