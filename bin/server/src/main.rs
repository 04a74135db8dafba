use campus_login_server::{app, config::ServerConfig, error::ServerError};
use rootcause::Report;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(report) = run().await {
        tracing::error!(error = %report, "server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<ServerError>> {
    let config = ServerConfig::from_env().map_err(ServerError::from)?;
    tracing::info!(
        bind_address = %config.bind_address,
        frontend_url = %config.frontend_url,
        backend = ?config.directory.backend,
        "loaded configuration"
    );

    let bind_address = config.bind_address.clone();
    let state = app::build_state(config).await?;

    app::serve(&bind_address, app::router(state)).await
}
