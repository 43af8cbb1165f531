use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    db::entities::reservation,
    error::AppError,
    services::reservation_service::{NewReservation, ReservationService, WebhookOutcome},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct ReservedDatesResponse {
    reserved_dates: Vec<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PreferenceResponse {
    preference_id: String,
    init_point: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    #[serde(rename = "type")]
    event_type: Option<String>,
    #[serde(rename = "data.id")]
    payment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Message {
    message: &'static str,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/disponibles", get(reserved_dates))
        .route("/", post(initiate).get(list))
        .route("/webhook/mp", post(webhook))
        .with_state(state)
}

fn service(state: &AppState) -> ReservationService<'_> {
    ReservationService::new(
        &state.db,
        state.payments.as_ref(),
        &state.config.frontend_url,
        &state.config.backend_url,
    )
}

async fn reserved_dates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReservedDatesResponse>, AppError> {
    let reserved_dates = service(&state).reserved_dates().await?;
    Ok(Json(ReservedDatesResponse { reserved_dates }))
}

async fn initiate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewReservation>,
) -> Result<Json<PreferenceResponse>, AppError> {
    let created = service(&state).initiate(body).await?;
    Ok(Json(PreferenceResponse {
        preference_id: created.id,
        init_point: created.init_point,
    }))
}

async fn webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookQuery>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let outcome = service(&state)
        .confirm(query.event_type.as_deref(), query.payment_id.as_deref())
        .await?;

    match outcome {
        WebhookOutcome::Confirmed(_) => Ok((
            StatusCode::CREATED,
            Json(Message {
                message: "Reservation confirmed",
            }),
        )),
        WebhookOutcome::Ignored(message) => Ok((StatusCode::OK, Json(Message { message }))),
    }
}

async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<reservation::Model>>, AppError> {
    Ok(Json(service(&state).list().await?))
}
