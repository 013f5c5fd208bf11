//! Player document operations.
//!
//! Every write is guarded by `banned = 0 AND ghost = 0` so a soft-disabled
//! player can never be mutated, even by a transaction that loaded them before
//! the flag was set.

use super::{decode_doc, encode_doc, level_from_column, Repository};
use crate::domain::{Level, PlayerId, PlayerRecord};
use sqlx::Row;

/// Referrer totals after a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditedReferrer {
    pub level: Level,
    pub points: i64,
}

impl Repository {
    /// Load a player's document, including soft-disabled players.
    pub async fn get_player(&self, id: PlayerId) -> Result<Option<PlayerRecord>, sqlx::Error> {
        let row = sqlx::query("SELECT doc, banned, ghost FROM players WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(decode_doc).transpose()
    }

    /// Insert a new player. Returns `false` if the id already exists.
    pub async fn insert_player(&self, record: &PlayerRecord) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO players (
                id, nickname, points, level, referrer_id, is_premium,
                banned, ghost, created_at, updated_at, doc
            ) VALUES (?, ?, ?, ?, ?, ?, 0, 0, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(record.id.as_i64())
        .bind(record.profile.nickname.as_deref())
        .bind(record.points)
        .bind(i64::from(record.level.0))
        .bind(record.profile.referral.as_ref().map(|r| r.referrer_id.as_i64()))
        .bind(record.is_premium())
        .bind(record.profile.created_at.timestamp_millis())
        .bind(record.profile.updated_at.timestamp_millis())
        .bind(encode_doc(record)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite an active player's document. Returns `false` when no active
    /// player with that id exists.
    pub async fn save_player(&self, record: &PlayerRecord) -> Result<bool, sqlx::Error> {
        self.update_player(record, false).await
    }

    /// Like `save_player`, but only while the stored nickname is still unset.
    /// Returns `false` when the nickname was already set (or the player is
    /// inactive); a taken nickname surfaces as a unique violation.
    pub async fn save_player_setting_nickname(
        &self,
        record: &PlayerRecord,
    ) -> Result<bool, sqlx::Error> {
        self.update_player(record, true).await
    }

    async fn update_player(
        &self,
        record: &PlayerRecord,
        nickname_unset: bool,
    ) -> Result<bool, sqlx::Error> {
        let sql = if nickname_unset {
            r#"
            UPDATE players
            SET nickname = ?, points = ?, level = ?, referrer_id = ?, is_premium = ?,
                updated_at = ?, doc = ?
            WHERE id = ? AND banned = 0 AND ghost = 0 AND nickname IS NULL
            "#
        } else {
            r#"
            UPDATE players
            SET nickname = ?, points = ?, level = ?, referrer_id = ?, is_premium = ?,
                updated_at = ?, doc = ?
            WHERE id = ? AND banned = 0 AND ghost = 0
            "#
        };

        let result = sqlx::query(sql)
            .bind(record.profile.nickname.as_deref())
            .bind(record.points)
            .bind(i64::from(record.level.0))
            .bind(record.profile.referral.as_ref().map(|r| r.referrer_id.as_i64()))
            .bind(record.is_premium())
            .bind(record.profile.updated_at.timestamp_millis())
            .bind(encode_doc(record)?)
            .bind(record.id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically add `points` to an active referrer's balance and referral
    /// earnings, optionally counting one more referral.
    ///
    /// Returns the referrer's new level and points, or `None` if the referrer
    /// is missing or soft-disabled.
    pub async fn credit_referrer(
        &self,
        referrer: PlayerId,
        points: i64,
        count_referral: bool,
    ) -> Result<Option<CreditedReferrer>, sqlx::Error> {
        let referral_inc: i64 = if count_referral { 1 } else { 0 };
        let row = sqlx::query(
            r#"
            UPDATE players
            SET points = points + ?,
                doc = json_set(
                    doc,
                    '$.points', points + ?,
                    '$.referralPoints', COALESCE(json_extract(doc, '$.referralPoints'), 0) + ?,
                    '$.referralCount', COALESCE(json_extract(doc, '$.referralCount'), 0) + ?
                )
            WHERE id = ? AND banned = 0 AND ghost = 0
            RETURNING level, points
            "#,
        )
        .bind(points)
        .bind(points)
        .bind(points)
        .bind(referral_inc)
        .bind(referrer.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| CreditedReferrer {
            level: level_from_column(row.get("level")),
            points: row.get("points"),
        }))
    }

    /// Case-insensitive nickname availability.
    pub async fn nickname_available(&self, nickname: &str) -> Result<bool, sqlx::Error> {
        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM players WHERE nickname = ?")
            .bind(nickname)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken == 0)
    }

    /// Administrative soft-disable. Returns `false` for unknown ids.
    pub async fn set_player_status(
        &self,
        id: PlayerId,
        banned: bool,
        ghost: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE players
            SET banned = ?, ghost = ?,
                doc = json_set(doc, '$.profile.banned', json(?), '$.profile.ghost', json(?))
            WHERE id = ?
            "#,
        )
        .bind(banned)
        .bind(ghost)
        .bind(if banned { "true" } else { "false" })
        .bind(if ghost { "true" } else { "false" })
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
