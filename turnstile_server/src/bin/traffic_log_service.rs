use clap::Parser;
use tokio::net::TcpListener;
use turnstile_axum::AuthGate;
use turnstile_server::{
    config::TrafficLogServiceConfig,
    gate::RemoteAuthorizer,
    telemetry,
    traffic_logs::{self, InMemoryTrafficLogs, TrafficLogState},
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;
    telemetry::init();

    let config = TrafficLogServiceConfig::parse();
    tracing::debug!(?config, "loaded configuration");

    let authorizer =
        RemoteAuthorizer::new(&config.auth_service_url, config.auth_service_timeout())?;
    let state = TrafficLogState::new(InMemoryTrafficLogs::new(), AuthGate::new(authorizer));
    let app = telemetry::trace_requests(traffic_logs::router(state));

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        auth_service = %config.auth_service_url,
        "traffic log service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
