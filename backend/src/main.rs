//! Pungde Crop Yield Prediction Service - Server
//!
//! Serves yield predictions to the Pungde farming assistant.

use pungde_prediction_service::{config::Config, create_app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "pungde_predict=debug,pungde_prediction_service=debug,tower_http=debug".into()
    });
    let json_logs = std::env::var("PUNGDE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let config = Config::load()?;

    tracing::info!("Starting Pungde Crop Yield Prediction Service");
    tracing::info!("Environment: {}", config.environment);

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Load artifacts and provider clients
    let state = AppState::initialize(config)?;
    tracing::info!(
        window = %state.predictor.window().describe(),
        "Embedding window fixed to training period"
    );

    // Build application
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
