use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::sync::Arc;
use summary_gateway::{api, config::Config, logging, processing::GatewayService};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(error = %error, "Invalid configuration; refusing to start");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "Loaded configuration");

    let service = match GatewayService::new(&config) {
        Ok(service) => service,
        Err(error) => {
            tracing::error!(error = %error, "Failed to initialize vendor clients");
            return ExitCode::FAILURE;
        }
    };
    let app = api::create_router(Arc::new(service), &config.cors_allowed_origins);

    let listener = match TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port)).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(error = %error, port = config.server_port, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Listening on http://0.0.0.0:{}", config.server_port);

    if let Err(error) = axum::serve(listener, app).await {
        tracing::error!(error = %error, "Server terminated");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
