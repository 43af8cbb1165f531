use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, payments::PaymentGateway, routes::router, state::AppState};

pub fn test_config(secret: &str) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "postgres://unused".to_string(),
        jwt_secret: secret.to_string(),
        mp_access_token: "test-token".to_string(),
        mp_base_url: "https://mp.example".to_string(),
        frontend_url: "https://front.example".to_string(),
        backend_url: "https://back.example/api".to_string(),
        log_level: "info".to_string(),
    }
}

pub fn test_router(db: DatabaseConnection, payments: Arc<dyn PaymentGateway>) -> Router {
    let state = AppState::new(test_config("test-secret"), db, payments);
    router(state)
}
