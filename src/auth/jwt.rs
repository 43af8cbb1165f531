use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use uuid::Uuid;

use super::{Claims, Role};
use crate::{
    error::AppError,
    state::{AppState, JwtKeys},
};

pub const TOKEN_TTL_SECS: usize = 60 * 60; // 1 hour

pub fn now_unix() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as usize
}

pub fn issue_token(keys: &JwtKeys, user_id: &Uuid, role: Role) -> Result<String, AppError> {
    let iat = now_unix();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat,
        exp: iat + TOKEN_TTL_SECS,
    };

    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".into());

    encode(&header, &claims, &keys.enc).map_err(|_| AppError::internal("Token encoding failed"))
}

pub fn decode_token(keys: &JwtKeys, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &keys.dec, &validation)
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;
    Ok(data.claims)
}

pub async fn jwt_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::unauthorized("Missing or invalid Authorization header").into_response()
    })?;

    let claims = decode_token(&state.jwt, token).map_err(|err| err.into_response())?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
