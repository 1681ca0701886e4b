use clap::Parser;
use tokio::net::TcpListener;
use turnstile_server::{
    auth::{self, AuthState},
    config::AuthServiceConfig,
    telemetry,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;
    telemetry::init();

    let config = AuthServiceConfig::parse();
    tracing::debug!(?config, "loaded configuration");

    let state = AuthState::from_config(&config)?;
    let app = telemetry::trace_requests(auth::router(state));

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        jwks = %config.jwks_endpoint,
        authorize = config.authorize_endpoint.as_ref().map(|url| url.as_str()),
        "auth service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
