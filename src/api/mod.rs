pub mod auth;
pub mod health;
pub mod leaderboard;
pub mod player;
pub mod session;

use crate::economy::EconomyService;
use crate::leaderboard::LeaderboardEngine;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub economy: Arc<EconomyService>,
    pub leaderboard: Arc<LeaderboardEngine>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(
        economy: Arc<EconomyService>,
        leaderboard: Arc<LeaderboardEngine>,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            economy,
            leaderboard,
            admin_token,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/session", post(session::create_session))
        .route("/v1/session/refresh", post(session::refresh_session))
        .route("/v1/nickname/check", get(session::check_nickname))
        .route("/v1/me", get(player::get_me))
        .route("/v1/me/nickname", put(session::set_nickname))
        .route("/v1/me/token", delete(session::revoke_token))
        .route("/v1/me/tap", post(player::tap))
        .route("/v1/me/boosts/:kind", post(player::purchase_boost))
        .route("/v1/me/energy/recharge", post(player::recharge_energy))
        .route(
            "/v1/me/autoclicker",
            post(player::create_auto_clicker).put(player::toggle_auto_clicker),
        )
        .route("/v1/me/level", post(player::level_up))
        .route("/v1/me/quests/:name", post(player::start_quest))
        .route(
            "/v1/me/channels/:channel",
            post(player::join_channel).delete(player::leave_channel),
        )
        .route("/v1/me/friends", get(leaderboard::get_friends))
        .route("/v1/leaderboard", get(leaderboard::get_leaderboard))
        .route(
            "/v1/admin/rankings/rebuild",
            post(leaderboard::rebuild_rankings),
        )
        .layer(cors)
        .with_state(state)
}
