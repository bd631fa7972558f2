// AI Farming API server

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ai_farming::{api::create_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading configuration
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ai_farming=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let address = config.server_address();

    let app_state = AppState::new(config).await?;
    let app = create_router(app_state);

    let listener = TcpListener::bind(&address).await?;
    tracing::info!("AI Farming API listening on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
