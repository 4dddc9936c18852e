use axum::{Extension, Json};
use serde::Serialize;

use crate::{
    middleware_layer::auth::CurrentUser,
    models::dashboard::{DashboardCard, DASHBOARD_CARDS},
    models::user::UserPayload,
};

/// The response payload for `/api/home`.
#[derive(Serialize)]
pub struct HomeResponse {
    pub authenticated: bool,
    pub user: UserPayload,
    pub dashboard: &'static [DashboardCard],
}

/// Returns the signed-in user together with the dashboard cards.
#[axum::debug_handler]
pub async fn home(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<HomeResponse> {
    tracing::debug!("🏠 Dashboard requested by {}", user.username);

    Json(HomeResponse {
        authenticated: true,
        user: UserPayload::from(&user),
        dashboard: &DASHBOARD_CARDS,
    })
}
