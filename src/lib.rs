pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod economy;
pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod ranking;
pub mod token;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Friend, LeaderboardPage, LeaderboardRow, LeaderboardTab, Level, PlayerId, PlayerRecord,
    RuleConfig,
};
pub use economy::EconomyService;
pub use error::{AppError, ErrorKind, GameError};
pub use leaderboard::LeaderboardEngine;
pub use ranking::{RankingStore, Scope};
pub use token::{KeyedTokenIssuer, TokenIssuer};
