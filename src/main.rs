//! Producto API server: settings from env, repository per provider, axum on tokio.

use producto_api::config::load_env_files;
use producto_api::{app, create_product_service, settings, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_files = load_env_files();
    let settings = settings()?;
    let default_level = if settings.debug { "producto_api=debug" } else { "producto_api=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
    if let Err(e) = env_files {
        tracing::warn!("failed to load .env.development: {}", e);
    }

    tracing::info!(
        environment = %settings.environment,
        provider = %settings.database.provider,
        "starting producto-api"
    );
    let products = create_product_service(settings)?;
    let router = app(AppState::new(products));

    let listener = TcpListener::bind(settings.bind_addr.as_str()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
