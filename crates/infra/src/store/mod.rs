//! Storage boundary for the planning pipeline.
//!
//! Engines never hold a process-wide connection. They receive a [`Store`]
//! handle and open one [`Session`] per run. A session is a unit of work:
//! writes are staged until [`Session::commit`] and discarded by
//! [`Session::rollback`] or by dropping the session.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use restock_core::ProductId;
use restock_products::Product;
use restock_replenishment::{ForecastRecord, RecommendationRecord};
use restock_sales::SalesObservation;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Storage operation error.
///
/// These are **infrastructure errors**, as opposed to domain errors
/// (validation, invariants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("failed to decode row: {0}")]
    Decode(String),
}

/// Historical sales, append-only.
pub trait SalesRepository {
    fn all_sales(&mut self) -> Result<Vec<SalesObservation>, StoreError>;

    /// Stage new observations; returns how many were staged.
    fn append_sales(&mut self, records: Vec<SalesObservation>) -> Result<usize, StoreError>;
}

/// Product metadata.
pub trait ProductRepository {
    /// All products, ordered by product id.
    fn all_products(&mut self) -> Result<Vec<Product>, StoreError>;

    /// Seed products. A product id that already exists is a `Conflict`.
    fn insert_products(&mut self, products: Vec<Product>) -> Result<usize, StoreError>;
}

/// Forecast rows, append-only (runs accumulate).
pub trait ForecastRepository {
    /// Every stored forecast row for a product, across all runs.
    fn forecasts_for(&mut self, product_id: &ProductId) -> Result<Vec<ForecastRecord>, StoreError>;

    fn append_forecast(&mut self, record: ForecastRecord) -> Result<(), StoreError>;
}

/// Recommendation rows, append-only.
pub trait RecommendationRepository {
    fn append_recommendation(&mut self, record: RecommendationRecord) -> Result<(), StoreError>;

    fn all_recommendations(&mut self) -> Result<Vec<RecommendationRecord>, StoreError>;
}

/// Unit of work over all repositories.
///
/// Reads observe committed data plus this session's own staged writes.
pub trait Session:
    SalesRepository + ProductRepository + ForecastRepository + RecommendationRepository
{
    /// Make staged writes durable. On error nothing staged is kept.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard staged writes.
    fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Factory for sessions (the injected store handle).
pub trait Store: Send + Sync {
    fn open(&self) -> Result<Box<dyn Session + '_>, StoreError>;
}

impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    fn open(&self) -> Result<Box<dyn Session + '_>, StoreError> {
        (**self).open()
    }
}
