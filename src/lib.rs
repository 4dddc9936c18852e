pub mod config;
pub mod db;
pub mod error;
pub mod messages;
pub mod routes;
pub mod state;

pub mod models {
    pub mod dashboard;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod memory;
    pub mod mysql;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod session;
}

pub mod handlers {
    pub mod auth;
    pub mod home;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod auth;
}
