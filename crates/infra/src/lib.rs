//! Infrastructure layer: stores, planning engines, configuration.

pub mod config;
pub mod engine;
pub mod store;

pub use config::{ConfigError, RestockConfig};
pub use engine::{
    EngineError, FailurePolicy, ForecastEngine, ForecastOutcome, ForecastReport,
    ForecastSettings, ProductOutcome, RecommendationEngine, RecommendationOutcome,
    RecommendationReport,
};
pub use store::{InMemoryStore, PostgresStore, Session, Store, StoreError};
