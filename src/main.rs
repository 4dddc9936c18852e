use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hk_reception::{config::Config, routes::build_router, state::AppState};

/// How often expired sessions are swept from memory.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config).await;

    match state.store.ping().await {
        Ok(()) => tracing::info!("✅ User store `{}` reachable", state.store.backend()),
        Err(e) => tracing::warn!(
            "⚠️ User store `{}` unreachable at startup: {}",
            state.store.backend(),
            e
        ),
    }

    let sweep_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(SESSION_SWEEP_INTERVAL).await;
            let removed = sweep_state.sessions.purge_expired().await;
            tracing::info!("🧹 Session sweep removed {} expired session(s)", removed);
        }
    });

    let app = build_router(state);

    tracing::info!("🚀 Server listening on http://{}", config.bind_addr);
    tracing::info!("✅ Background session sweep started (runs every hour)");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
