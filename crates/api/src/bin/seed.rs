//! Seed the product catalog with the default products.
//!
//! Uses the same configuration as the API server; with the in-memory store
//! this only validates the catalog, so point it at Postgres to persist.

use anyhow::Context;

use restock_api::app::services::build_services;
use restock_infra::store::{ProductRepository, Session};
use restock_infra::{RestockConfig, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    restock_observability::init();

    let config = RestockConfig::from_env().context("invalid configuration")?;
    if !config.use_persistent_stores {
        tracing::warn!("USE_PERSISTENT_STORES is not set; seeded products will not outlive this process");
    }

    let catalog = restock_products::default_catalog().context("invalid seed catalog")?;

    let services = build_services(&config).await?;
    let inserted = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
        let mut session = services.store.open()?;
        let n = session.insert_products(catalog)?;
        session.commit()?;
        Ok(n)
    })
    .await
    .context("seeding task failed")??;

    tracing::info!(products = inserted, "product catalog seeded");
    Ok(())
}
