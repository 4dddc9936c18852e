use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;

use crate::config::MySqlSettings;

/// Builds the connect options for the MySQL user store.
pub fn connect_options(settings: &MySqlSettings) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .database(&settings.database)
        .charset("utf8mb4");

    if settings.password.is_empty() {
        options
    } else {
        options.password(&settings.password)
    }
}

/// Opens a fresh connection. Callers close it once their statement is done.
pub async fn connect(options: &MySqlConnectOptions) -> Result<MySqlConnection, sqlx::Error> {
    MySqlConnection::connect_with(options).await
}
