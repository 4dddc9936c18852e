use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::repositories::{memory::MemoryUserStore, mysql::MySqlUserStore, user::UserStore};
use crate::services::session::SessionManager;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The user store.
    pub store: Arc<dyn UserStore>,
    /// Live sessions keyed by cookie token.
    pub sessions: SessionManager,
    /// The application's configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new `AppState` with the store selected by `config`.
    ///
    /// For MySQL the `login` table is created when missing. An unreachable
    /// database is logged and does not stop startup; requests then fail
    /// with a 500 until it comes back.
    pub async fn new(config: &Config) -> Self {
        let store: Arc<dyn UserStore> = match config.store_backend {
            StoreBackend::MySql => {
                let store = MySqlUserStore::new(&config.mysql);
                match store.ensure_schema().await {
                    Ok(()) => tracing::info!(
                        "✅ MySQL user store ready at {}:{}/{}",
                        config.mysql.host,
                        config.mysql.port,
                        config.mysql.database
                    ),
                    Err(e) => tracing::warn!("⚠️ MySQL user store not reachable yet: {}", e),
                }
                Arc::new(store)
            }
            StoreBackend::Memory => {
                tracing::info!("✅ In-memory user store initialized");
                Arc::new(MemoryUserStore::new())
            }
        };

        Self::with_store(config, store)
    }

    /// Creates an `AppState` around an already constructed store.
    pub fn with_store(config: &Config, store: Arc<dyn UserStore>) -> Self {
        let sessions = SessionManager::new(config.session_duration_days);
        tracing::info!(
            "✅ Session manager initialized ({} day lifetime)",
            config.session_duration_days
        );

        AppState {
            store,
            sessions,
            config: Arc::new(config.clone()),
        }
    }
}
