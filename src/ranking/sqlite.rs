//! Ranking index kept in the SQLite database next to the player documents.

use super::{RankingError, RankingStore, Scope};
use crate::db::to_sql_int;
use crate::domain::PlayerId;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// Ranking store backed by the `rankings` table. Ties resolve by first
/// insertion (`seq`).
#[derive(Debug, Clone)]
pub struct SqliteRankingStore {
    pool: SqlitePool,
}

impl SqliteRankingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RankingStore for SqliteRankingStore {
    async fn upsert_score(
        &self,
        scope: Scope,
        player: PlayerId,
        score: i64,
    ) -> Result<(), RankingError> {
        sqlx::query(
            r#"
            INSERT INTO rankings (scope, player_id, score)
            VALUES (?, ?, ?)
            ON CONFLICT(scope, player_id) DO UPDATE SET score = excluded.score
            "#,
        )
        .bind(scope.key())
        .bind(player.as_i64())
        .bind(score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn descending_rank(
        &self,
        scope: Scope,
        player: PlayerId,
    ) -> Result<Option<u64>, RankingError> {
        let key = scope.key();
        let row = sqlx::query("SELECT score, seq FROM rankings WHERE scope = ? AND player_id = ?")
            .bind(&key)
            .bind(player.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let score: i64 = row.get("score");
        let seq: i64 = row.get("seq");

        let ahead: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM rankings
            WHERE scope = ? AND (score > ? OR (score = ? AND seq < ?))
            "#,
        )
        .bind(&key)
        .bind(score)
        .bind(score)
        .bind(seq)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(ahead as u64 + 1))
    }

    async fn descending_range(
        &self,
        scope: Scope,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PlayerId>, RankingError> {
        let rows = sqlx::query(
            r#"
            SELECT player_id FROM rankings
            WHERE scope = ?
            ORDER BY score DESC, seq ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(scope.key())
        .bind(to_sql_int(limit))
        .bind(to_sql_int(offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PlayerId::new(row.get("player_id")))
            .collect())
    }

    async fn flush(&self, scope: Scope) -> Result<(), RankingError> {
        sqlx::query("DELETE FROM rankings WHERE scope = ?")
            .bind(scope.key())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
