use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod reservations;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/reservas", reservations::router(state))
}
