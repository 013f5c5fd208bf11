//! Read-side queries backing leaderboard and friends views.

use super::{level_from_column, referee_from_row, RefereeRow, Repository};
use crate::domain::{Level, LeaderboardRow, PlayerId};
use sqlx::Row;

// SQLite has a 999 parameter limit; chunk to 500 for safety margin.
const CHUNK_SIZE: usize = 500;

/// SQLite binds are signed; anything past `i64::MAX` is past the end anyway.
pub(crate) fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl Repository {
    /// Display rows for rankable players among `ids`, with `rank = 0`.
    ///
    /// Rows come back in no particular order; callers restore ranking order.
    pub async fn leaderboard_rows(
        &self,
        ids: &[PlayerId],
    ) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
        let mut out = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                r#"
                SELECT id, nickname, level, is_premium, points
                FROM players
                WHERE id IN ({}) AND banned = 0 AND ghost = 0 AND nickname IS NOT NULL
                "#,
                placeholders
            );

            let mut query = sqlx::query(&sql);
            for id in chunk {
                query = query.bind(id.as_i64());
            }

            let rows = query.fetch_all(&self.pool).await?;
            out.extend(rows.iter().map(|row| {
                let referee = referee_from_row(row);
                LeaderboardRow {
                    player_id: referee.player_id,
                    nickname: referee.nickname.unwrap_or_default(),
                    level: referee.level,
                    is_premium: referee.is_premium,
                    points: referee.points,
                    rank: 0,
                }
            }));
        }
        Ok(out)
    }

    /// Named, visible referees of `referrer`, by points descending.
    pub async fn ranked_referees(
        &self,
        referrer: PlayerId,
        limit: u64,
        skip: u64,
    ) -> Result<Vec<RefereeRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, nickname, level, is_premium, points
            FROM players
            WHERE referrer_id = ? AND ghost = 0 AND nickname IS NOT NULL
            ORDER BY points DESC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(referrer.as_i64())
        .bind(to_sql_int(limit))
        .bind(to_sql_int(skip))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(referee_from_row).collect())
    }

    pub async fn count_ranked_referees(&self, referrer: PlayerId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM players WHERE referrer_id = ? AND ghost = 0 AND nickname IS NOT NULL",
        )
        .bind(referrer.as_i64())
        .fetch_one(&self.pool)
        .await
    }

    /// Every visible referee of `referrer`, highest level first.
    pub async fn referees(
        &self,
        referrer: PlayerId,
        limit: u64,
        skip: u64,
    ) -> Result<Vec<RefereeRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, nickname, level, is_premium, points
            FROM players
            WHERE referrer_id = ? AND ghost = 0
            ORDER BY level DESC, points DESC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(referrer.as_i64())
        .bind(to_sql_int(limit))
        .bind(to_sql_int(skip))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(referee_from_row).collect())
    }

    pub async fn count_referees(&self, referrer: PlayerId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM players WHERE referrer_id = ? AND ghost = 0")
            .bind(referrer.as_i64())
            .fetch_one(&self.pool)
            .await
    }

    /// Rankable players, optionally restricted to one level.
    pub async fn count_rankable(&self, level: Option<Level>) -> Result<i64, sqlx::Error> {
        let base = "SELECT COUNT(*) FROM players WHERE banned = 0 AND ghost = 0 AND nickname IS NOT NULL";
        match level {
            Some(level) => {
                let sql = format!("{base} AND level = ?");
                sqlx::query_scalar(&sql)
                    .bind(i64::from(level.0))
                    .fetch_one(&self.pool)
                    .await
            }
            None => sqlx::query_scalar(base).fetch_one(&self.pool).await,
        }
    }

    /// `(id, level, points)` of every rankable player, for index rebuilds.
    pub async fn rankable_scores(&self) -> Result<Vec<(PlayerId, Level, i64)>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, level, points
            FROM players
            WHERE banned = 0 AND ghost = 0 AND nickname IS NOT NULL
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                (
                    PlayerId::new(row.get("id")),
                    level_from_column(row.get("level")),
                    row.get("points"),
                )
            })
            .collect())
    }
}
