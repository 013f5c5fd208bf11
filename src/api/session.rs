use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::auth;
use crate::api::AppState;
use crate::domain::{PlatformProfile, PlayerId, PlayerRecord};
use crate::economy::ReferralSettlement;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub id: i64,
    /// Client-supplied profile. `isPremium` is not trusted from here.
    #[serde(default)]
    pub platform: PlatformProfile,
    /// Referrer's numeric id, as carried in the invite link.
    pub referral: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub player: PlayerRecord,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct NicknameQuery {
    pub nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NicknameRequest {
    pub nickname: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NicknameResponse {
    pub player: PlayerRecord,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<ReferralSettlement>,
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if body.id <= 0 {
        return Err(AppError::BadRequest("id must be positive".to_string()));
    }
    let mut platform = body.platform;
    if platform.is_premium {
        debug!(player = body.id, "Ignoring unverified premium claim");
        platform.is_premium = false;
    }
    let (player, token) = state
        .economy
        .get_or_create_player(
            PlayerId::new(body.id),
            platform,
            body.referral.as_deref(),
            Utc::now(),
        )
        .await?;
    Ok(Json(SessionResponse { player, token }))
}

pub async fn refresh_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AppError> {
    let token = auth::bearer(&headers)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    let (player, token) = state.economy.refresh_token(token, Utc::now()).await?;
    Ok(Json(SessionResponse { player, token }))
}

pub async fn revoke_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let now = Utc::now();
    let id = auth::player_id(&state, &headers, now).await?;
    state.economy.revoke_token(id, now).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_nickname(
    State(state): State<AppState>,
    Query(params): Query<NicknameQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let nickname = params
        .nickname
        .ok_or_else(|| AppError::BadRequest("nickname is required".to_string()))?;
    let available = state.economy.check_nickname(&nickname).await?;
    Ok(Json(serde_json::json!({ "available": available })))
}

pub async fn set_nickname(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NicknameRequest>,
) -> Result<Json<NicknameResponse>, AppError> {
    let now = Utc::now();
    let id = auth::player_id(&state, &headers, now).await?;
    let (player, token, settlement) = state
        .economy
        .set_nickname(id, body.nickname.trim(), now)
        .await?;
    Ok(Json(NicknameResponse {
        player,
        token,
        settlement,
    }))
}
