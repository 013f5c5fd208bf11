//! Ranking index abstraction.
//!
//! The ranking store keeps one score-ordered index per competitive scope and
//! answers rank lookups only. Point values always come from the document store.

use crate::domain::{Level, PlayerId};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod memory;
pub mod propagator;
pub mod redis;
pub mod sqlite;

pub use self::redis::RedisRankingStore;
pub use memory::MemoryRankingStore;
pub use propagator::{PropagationMode, RankPropagator};
pub use sqlite::SqliteRankingStore;

/// A leaderboard competition grouping backed by the ranking store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Level(Level),
}

impl Scope {
    /// Storage key: `global` or `lv{n}`.
    pub fn key(&self) -> String {
        match self {
            Scope::Global => "global".to_string(),
            Scope::Level(level) => level.to_string(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("redis ranking store: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("sqlite ranking store: {0}")]
    Sqlite(#[from] sqlx::Error),
    #[error("ranking store unavailable: {0}")]
    Unavailable(String),
}

/// Ordered-score index, one per scope.
///
/// Ranks are 1-based and descending by score. Ties keep a stable order
/// within the lifetime of the index.
#[async_trait]
pub trait RankingStore: Send + Sync + fmt::Debug {
    /// Insert or replace the player's score in `scope`.
    async fn upsert_score(
        &self,
        scope: Scope,
        player: PlayerId,
        score: i64,
    ) -> Result<(), RankingError>;

    /// 1-based descending rank, or `None` when the player is not indexed.
    async fn descending_rank(
        &self,
        scope: Scope,
        player: PlayerId,
    ) -> Result<Option<u64>, RankingError>;

    /// Player ids at positions `[offset, offset + limit)` in descending order.
    async fn descending_range(
        &self,
        scope: Scope,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PlayerId>, RankingError>;

    /// Drop every entry in `scope`. Administrative use only.
    async fn flush(&self, scope: Scope) -> Result<(), RankingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_keys() {
        assert_eq!(Scope::Global.key(), "global");
        assert_eq!(Scope::Level(Level::new(3)).key(), "lv3");
        assert_eq!(Scope::Level(Level::ZERO).to_string(), "lv0");
    }

    #[test]
    fn test_error_display() {
        let err = RankingError::Unavailable("writes disabled".to_string());
        assert_eq!(err.to_string(), "ranking store unavailable: writes disabled");
    }
}
