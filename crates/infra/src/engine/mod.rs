//! Planning batch jobs.
//!
//! - [`ForecastEngine`]: sales history -> forecast rows, committed per product.
//! - [`RecommendationEngine`]: forecast rows + products -> recommendation rows,
//!   committed once per run.
//!
//! Both engines are synchronous and hold an in-process run lock; callers on an
//! async runtime should run them on the blocking pool.

mod error;
pub mod forecast;
mod lock;
pub mod recommendation;
pub mod report;

use tracing::warn;

use crate::store::Session;

pub use error::EngineError;
pub use forecast::{FailurePolicy, ForecastEngine, ForecastSettings};
pub use recommendation::RecommendationEngine;
pub use report::{
    ForecastOutcome, ForecastReport, ProductOutcome, RecommendationOutcome, RecommendationReport,
};

/// Roll back staged writes and hand back the error that caused it. A failed
/// rollback is logged; the original error wins.
pub(crate) fn rollback_quietly(session: &mut dyn Session, err: EngineError) -> EngineError {
    if let Err(rollback_err) = session.rollback() {
        warn!(error = %rollback_err, "rollback failed");
    }
    err
}
