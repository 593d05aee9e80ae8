use std::sync::Arc;

use anyhow::Context;

use restock_ai::AdditiveModel;
use restock_infra::{
    EngineError, ForecastEngine, InMemoryStore, PostgresStore, RecommendationEngine,
    RestockConfig, Store,
};

/// Shared store handle used by every request.
pub type SharedStore = Arc<dyn Store>;

/// Engines and the store they share, wired once at startup.
pub struct AppServices {
    pub store: SharedStore,
    pub forecast: ForecastEngine<SharedStore>,
    pub recommend: RecommendationEngine<SharedStore>,
}

impl AppServices {
    pub fn new(store: SharedStore, config: &RestockConfig) -> Result<Self, EngineError> {
        let model = AdditiveModel::new(config.model.clone()).map_err(|source| {
            EngineError::Domain(restock_core::DomainError::validation(source.to_string()))
        })?;
        Ok(Self {
            forecast: ForecastEngine::new(store.clone(), Arc::new(model), config.forecast.clone())?,
            recommend: RecommendationEngine::new(store.clone(), config.reorder.clone())?,
            store,
        })
    }

    /// In-memory wiring with default settings (dev/test).
    pub fn in_memory() -> Result<Self, EngineError> {
        Self::new(Arc::new(InMemoryStore::new()), &RestockConfig::default())
    }
}

pub async fn build_services(config: &RestockConfig) -> anyhow::Result<AppServices> {
    let store: SharedStore = if config.use_persistent_stores {
        let url = config
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;
        let pg = PostgresStore::connect(url, config.max_db_connections)
            .await
            .context("failed to connect to Postgres")?;
        pg.migrate().await.context("failed to apply schema")?;
        tracing::info!("using Postgres store");
        Arc::new(pg)
    } else {
        tracing::info!("using in-memory store");
        Arc::new(InMemoryStore::new())
    };

    Ok(AppServices::new(store, config)?)
}
