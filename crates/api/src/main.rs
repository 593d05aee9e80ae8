use anyhow::Context;

use restock_infra::RestockConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    restock_observability::init();

    let config = RestockConfig::from_env().context("invalid configuration")?;
    let app = restock_api::app::build_app_from_config(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
