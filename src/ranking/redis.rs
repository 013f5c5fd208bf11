//! Ranking index on Redis sorted sets.

use super::{RankingError, RankingStore, Scope};
use crate::domain::PlayerId;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::Mutex;

/// Sorted-set ranking store. One key per scope under `prefix`.
///
/// The connection is opened lazily and dropped after any command error so the
/// next call reconnects.
pub struct RedisRankingStore {
    client: redis::Client,
    connection: Mutex<Option<redis::aio::ConnectionManager>>,
    prefix: String,
}

impl fmt::Debug for RedisRankingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisRankingStore")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl RedisRankingStore {
    pub fn new(url: &str, prefix: impl Into<String>) -> Result<Self, RankingError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            prefix: prefix.into(),
        })
    }

    fn key(&self, scope: Scope) -> String {
        format!("{}{}", self.prefix, scope.key())
    }

    /// A handle on the shared connection, opening it on first use. Commands
    /// run on the clone, outside the lock.
    async fn handle(&self) -> Result<redis::aio::ConnectionManager, RankingError> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.client.get_connection_manager().await?;
        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Run one command, resetting the cached connection if it fails.
    async fn run<T: redis::FromRedisValue>(&self, cmd: redis::Cmd) -> Result<T, RankingError> {
        let mut conn = self.handle().await?;
        match cmd.query_async(&mut conn).await {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!("Redis ranking command failed: {err}");
                *self.connection.lock().await = None;
                Err(err.into())
            }
        }
    }
}

/// Inclusive `ZREVRANGE` bounds for a page, or `None` when the page is empty
/// or starts beyond what Redis can index.
fn range_bounds(offset: u64, limit: u64) -> Option<(i64, i64)> {
    if limit == 0 {
        return None;
    }
    let start = i64::try_from(offset).ok()?;
    let stop = offset.saturating_add(limit - 1);
    Some((start, i64::try_from(stop).unwrap_or(i64::MAX)))
}

#[async_trait]
impl RankingStore for RedisRankingStore {
    async fn upsert_score(
        &self,
        scope: Scope,
        player: PlayerId,
        score: i64,
    ) -> Result<(), RankingError> {
        let mut cmd = redis::cmd("ZADD");
        cmd.arg(self.key(scope)).arg(score).arg(player.as_i64());
        let _: i64 = self.run(cmd).await?;
        Ok(())
    }

    async fn descending_rank(
        &self,
        scope: Scope,
        player: PlayerId,
    ) -> Result<Option<u64>, RankingError> {
        let mut cmd = redis::cmd("ZREVRANK");
        cmd.arg(self.key(scope)).arg(player.as_i64());
        let rank: Option<u64> = self.run(cmd).await?;
        Ok(rank.map(|r| r + 1))
    }

    async fn descending_range(
        &self,
        scope: Scope,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PlayerId>, RankingError> {
        let Some((start, stop)) = range_bounds(offset, limit) else {
            return Ok(Vec::new());
        };
        let mut cmd = redis::cmd("ZREVRANGE");
        cmd.arg(self.key(scope)).arg(start).arg(stop);
        let ids: Vec<i64> = self.run(cmd).await?;
        Ok(ids.into_iter().map(PlayerId::new).collect())
    }

    async fn flush(&self, scope: Scope) -> Result<(), RankingError> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(self.key(scope));
        let _: i64 = self.run(cmd).await?;
        Ok(())
    }
}
