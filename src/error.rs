use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::engine::LevelRequirement;
use crate::ranking::RankingError;
use crate::token::TokenError;

/// How a caller should treat a failed game operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AccessDenied,
    ResourceExhausted,
    PreconditionFailed,
    Upstream,
    Invalid,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("no such player")]
    NoSuchPlayer,
    #[error("player is banned")]
    Banned,
    #[error("player is disabled")]
    Ghost,

    #[error("no tap energy")]
    NoTapEnergy,
    #[error("no boost slots left at this level")]
    NoBoostSlotsLeft,
    #[error("insufficient points: need {required}, have {available}")]
    InsufficientPoints { required: i64, available: i64 },
    #[error("no energy recharges left today")]
    NoRechargeAllowance,
    #[error("energy recharge available in {retry_after_secs}s")]
    RechargeTooSoon { retry_after_secs: i64 },

    #[error("level requirements not met: {0}")]
    LevelRequirementsNotMet(LevelRequirement),
    #[error("nickname is taken")]
    NicknameConflict,
    #[error("nickname already set")]
    NicknameAlreadySet,
    #[error("set a nickname first")]
    NicknameRequired,
    #[error("invalid nickname")]
    InvalidNickname,
    #[error("auto-clicker already active")]
    AutoClickerAlreadyActive,
    #[error("auto-clicker not active")]
    AutoClickerNotActive,
    #[error("auto-clicker requires level {0}")]
    AutoClickerLocked(crate::domain::Level),
    #[error("quest already started or solved")]
    QuestAlreadyResolved,
    #[error("unknown quest: {0}")]
    UnknownQuest(String),
    #[error("unknown channel: {0}")]
    UnknownChannel(i64),

    #[error("document store: {0}")]
    Store(#[from] sqlx::Error),
    #[error("ranking store: {0}")]
    Ranking(#[from] RankingError),
    #[error("token: {0}")]
    Token(#[from] TokenError),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::NoSuchPlayer | GameError::Banned | GameError::Ghost => {
                ErrorKind::AccessDenied
            }
            GameError::NoTapEnergy
            | GameError::NoBoostSlotsLeft
            | GameError::InsufficientPoints { .. }
            | GameError::NoRechargeAllowance
            | GameError::RechargeTooSoon { .. } => ErrorKind::ResourceExhausted,
            GameError::LevelRequirementsNotMet(_)
            | GameError::NicknameConflict
            | GameError::NicknameAlreadySet
            | GameError::NicknameRequired
            | GameError::AutoClickerAlreadyActive
            | GameError::AutoClickerNotActive
            | GameError::AutoClickerLocked(_)
            | GameError::QuestAlreadyResolved => ErrorKind::PreconditionFailed,
            GameError::InvalidNickname | GameError::UnknownQuest(_) | GameError::UnknownChannel(_) => {
                ErrorKind::Invalid
            }
            // Bad or stale credentials deny access rather than fail upstream
            GameError::Token(TokenError::Encode(_)) => ErrorKind::Upstream,
            GameError::Token(_) => ErrorKind::AccessDenied,
            GameError::Store(_) | GameError::Ranking(_) => ErrorKind::Upstream,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<GameError> for AppError {
    fn from(err: GameError) -> Self {
        let msg = err.to_string();
        match (err.kind(), &err) {
            (ErrorKind::AccessDenied, GameError::Token(_)) => AppError::Unauthorized(msg),
            (ErrorKind::AccessDenied, _) => AppError::Forbidden(msg),
            (ErrorKind::ResourceExhausted, _) | (ErrorKind::Invalid, _) => {
                AppError::BadRequest(msg)
            }
            (ErrorKind::PreconditionFailed, _) => AppError::Conflict(msg),
            (ErrorKind::Upstream, _) => {
                tracing::error!(error = %err, "Upstream failure");
                AppError::Internal(msg)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
