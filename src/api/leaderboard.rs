use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::auth;
use crate::api::AppState;
use crate::domain::{Friend, LeaderboardPage, LeaderboardTab};
use crate::error::AppError;

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;
const MAX_SKIP: u64 = i64::MAX as u64;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub tab: Option<String>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub friends: Vec<Friend>,
    pub total: i64,
}

fn page(limit: Option<u64>, skip: Option<u64>) -> Result<(u64, u64), AppError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    let skip = skip.unwrap_or(0);
    if skip > MAX_SKIP {
        return Err(AppError::BadRequest(format!(
            "skip must be at most {}",
            MAX_SKIP
        )));
    }
    Ok((limit, skip))
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardPage>, AppError> {
    let tab = match params.tab.as_deref() {
        None => LeaderboardTab::Global,
        Some(tab) => LeaderboardTab::from_str(tab).map_err(|_| {
            AppError::BadRequest("tab must be one of: friends, level, global".to_string())
        })?,
    };
    let (limit, skip) = page(params.limit, params.skip)?;
    let now = Utc::now();
    let id = auth::player_id(&state, &headers, now).await?;

    Ok(Json(state.leaderboard.read(id, tab, limit, skip, now).await?))
}

pub async fn get_friends(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageQuery>,
) -> Result<Json<FriendsResponse>, AppError> {
    let (limit, skip) = page(params.limit, params.skip)?;
    let id = auth::player_id(&state, &headers, Utc::now()).await?;

    let (friends, total) = state.leaderboard.read_friends(id, limit, skip).await?;
    Ok(Json(FriendsResponse { friends, total }))
}

pub async fn rebuild_rankings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    auth::require_admin(&state, &headers)?;
    let indexed = state.leaderboard.rebuild_index().await?;
    Ok(Json(serde_json::json!({ "indexed": indexed })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_bounds() {
        assert_eq!(page(None, None).unwrap(), (DEFAULT_LIMIT, 0));
        assert_eq!(page(Some(5), Some(10)).unwrap(), (5, 10));
        assert!(page(Some(0), None).is_err());
        assert!(page(Some(MAX_LIMIT + 1), None).is_err());
        assert_eq!(page(None, Some(MAX_SKIP)).unwrap(), (DEFAULT_LIMIT, MAX_SKIP));
        assert!(page(None, Some(MAX_SKIP + 1)).is_err());
        assert!(page(None, Some(u64::MAX)).is_err());
    }
}
