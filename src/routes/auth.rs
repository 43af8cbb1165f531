use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    auth::{Claims, Role, jwt::jwt_auth},
    error::AppError,
    services::auth_service::{AuthService, LoginOutcome, PublicUser},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: String,
    password: String,
    email: String,
    role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}

async fn me(claims: Claims) -> Json<Claims> {
    Json(claims)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let service = AuthService::new(&state.db, &state.jwt);
    let user = service
        .register(&body.username, &body.password, &body.email, body.role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginOutcome>, AppError> {
    let service = AuthService::new(&state.db, &state.jwt);
    let outcome = service.login(&body.username, &body.password).await?;
    Ok(Json(outcome))
}
