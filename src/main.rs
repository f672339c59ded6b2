use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use readynews::config::Config;
use readynews::routes::{self, AppState};
use readynews::upstream::Upstream;

const CONFIG_PATH: &str = "readynews.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "readynews=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = if Path::new(CONFIG_PATH).exists() {
        Config::load(CONFIG_PATH)?
    } else {
        Config::default()
    };
    let config = config.apply_env(|key| std::env::var(key).ok())?;
    if config.api_key.is_empty() {
        warn!("No NEWS_API_KEY set, upstream requests will be rejected");
    }

    let upstream = Upstream::from_config(&config)?;
    info!("Forwarding to {}", config.upstream_url);

    let state = Arc::new(AppState {
        source: Arc::new(upstream),
    });
    let app = routes::router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
