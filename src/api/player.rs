use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use std::str::FromStr;

use crate::api::auth;
use crate::api::AppState;
use crate::domain::PlayerRecord;
use crate::economy::BoostKind;
use crate::error::AppError;

/// Largest tap batch accepted in one request.
const MAX_TAP_BATCH: u64 = 10_000;

#[derive(Debug, Deserialize)]
pub struct TapRequest {
    pub count: u64,
}

pub async fn get_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlayerRecord>, AppError> {
    let now = Utc::now();
    let id = auth::player_id(&state, &headers, now).await?;
    Ok(Json(state.economy.read_player(id, now).await?))
}

pub async fn tap(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TapRequest>,
) -> Result<Json<PlayerRecord>, AppError> {
    if body.count == 0 || body.count > MAX_TAP_BATCH {
        return Err(AppError::BadRequest(format!(
            "count must be between 1 and {}",
            MAX_TAP_BATCH
        )));
    }
    let now = Utc::now();
    let id = auth::named_player_id(&state, &headers, now).await?;
    Ok(Json(state.economy.tap(id, body.count, now).await?))
}

pub async fn purchase_boost(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(kind): Path<String>,
) -> Result<Json<PlayerRecord>, AppError> {
    let kind = BoostKind::from_str(&kind)
        .map_err(|_| AppError::BadRequest("kind must be one of: tap, energy".to_string()))?;
    let now = Utc::now();
    let id = auth::named_player_id(&state, &headers, now).await?;
    Ok(Json(state.economy.purchase_boost(id, kind, now).await?))
}

pub async fn recharge_energy(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlayerRecord>, AppError> {
    let now = Utc::now();
    let id = auth::named_player_id(&state, &headers, now).await?;
    Ok(Json(state.economy.recharge_energy(id, now).await?))
}

pub async fn create_auto_clicker(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlayerRecord>, AppError> {
    let now = Utc::now();
    let id = auth::named_player_id(&state, &headers, now).await?;
    Ok(Json(state.economy.create_auto_clicker(id, now).await?))
}

pub async fn toggle_auto_clicker(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlayerRecord>, AppError> {
    let now = Utc::now();
    let id = auth::named_player_id(&state, &headers, now).await?;
    Ok(Json(state.economy.toggle_auto_clicker(id, now).await?))
}

pub async fn level_up(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlayerRecord>, AppError> {
    let now = Utc::now();
    let id = auth::player_id(&state, &headers, now).await?;
    Ok(Json(state.economy.level_up(id, now).await?))
}

pub async fn start_quest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<PlayerRecord>, AppError> {
    let now = Utc::now();
    let id = auth::player_id(&state, &headers, now).await?;
    Ok(Json(state.economy.start_quest(id, &name, now).await?))
}

pub async fn join_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(channel): Path<i64>,
) -> Result<Json<PlayerRecord>, AppError> {
    let now = Utc::now();
    let id = auth::player_id(&state, &headers, now).await?;
    Ok(Json(state.economy.join_channel(id, channel, now).await?))
}

pub async fn leave_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(channel): Path<i64>,
) -> Result<Json<PlayerRecord>, AppError> {
    let now = Utc::now();
    let id = auth::player_id(&state, &headers, now).await?;
    Ok(Json(state.economy.leave_channel(id, channel, now).await?))
}
