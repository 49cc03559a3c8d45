use std::sync::Arc;

use anyhow::Context;

use fueleu_infra::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env().context("invalid configuration")?;
    fueleu_observability::init(config.log_format);

    let services = fueleu_api::app::services::build_services(&config).await?;
    let app = fueleu_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
