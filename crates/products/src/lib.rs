//! Product catalog module.
//!
//! Product metadata is seeded ahead of pipeline runs and is read-only while the
//! forecasting and recommendation engines execute.

pub mod product;
pub mod seed;

pub use product::{Product, ProductType, MAX_LEAD_TIME_DAYS};
pub use seed::default_catalog;
