use anyhow::Context;

use saude_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("failed to load configuration")?;
    saude_observability::init(config.log_format);

    let app = saude_api::app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        max_page_size = config.max_page_size,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
