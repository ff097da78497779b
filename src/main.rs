use std::sync::Arc;

use anyhow::Context;
use hr_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    identity::IdentityProvider,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, starts the identity provider's key loading in the
/// background and serves the router. Requests arriving before the key is loaded see the
/// loading page on protected routes.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = AppConfig::load().context("invalid configuration")?;

    // RUST_LOG wins; otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hr_portal=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!(
        auth_enabled = config.auth_enabled,
        "Application starting in {:?} mode",
        config.env
    );

    let identity = Arc::new(IdentityProvider::from_config(&config));

    // With the flag off the guards never look at the provider, so skip key loading.
    if config.auth_enabled {
        let source = IdentityProvider::key_source(&config);
        let provider = identity.clone();
        tokio::spawn(async move {
            if let Err(e) = provider.initialize(source.as_ref()).await {
                tracing::error!(error = %e, "Identity provider failed to initialize; protected pages stay pending.");
            }
        });
    } else {
        tracing::warn!("AUTH_ENABLED is off: every page is served without authentication.");
    }

    let bind_addr = config.bind_addr;
    let app = create_router(AppState { config, identity });

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
