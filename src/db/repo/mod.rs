//! Repository layer for database operations.
//!
//! Methods are organized across submodules by concern:
//! - `players.rs` - Player document reads and guarded writes
//! - `views.rs` - Leaderboard, friends and count queries

mod players;
mod views;

pub use players::CreditedReferrer;
pub(crate) use views::to_sql_int;

use crate::domain::{Level, PlayerId, PlayerRecord};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

/// A referee as stored, before it is shaped into a view row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefereeRow {
    pub player_id: PlayerId,
    pub nickname: Option<String>,
    pub level: Level,
    pub is_premium: bool,
    pub points: i64,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Whether `err` is a UNIQUE constraint failure.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

fn encode_doc(record: &PlayerRecord) -> Result<String, sqlx::Error> {
    serde_json::to_string(record).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Decode the stored document. The scalar soft-disable columns win over the
/// document copy since administrative tooling writes only the columns.
fn decode_doc(row: &SqliteRow) -> Result<PlayerRecord, sqlx::Error> {
    let doc: String = row.get("doc");
    let mut record: PlayerRecord =
        serde_json::from_str(&doc).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    record.profile.banned = row.get::<i64, _>("banned") != 0;
    record.profile.ghost = row.get::<i64, _>("ghost") != 0;
    Ok(record)
}

fn level_from_column(value: i64) -> Level {
    Level::new(value.clamp(0, u8::MAX as i64) as u8)
}

fn referee_from_row(row: &SqliteRow) -> RefereeRow {
    RefereeRow {
        player_id: PlayerId::new(row.get("id")),
        nickname: row.get("nickname"),
        level: level_from_column(row.get("level")),
        is_premium: row.get::<i64, _>("is_premium") != 0,
        points: row.get("points"),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Repository;
    use crate::db::init_db;
    use tempfile::TempDir;

    pub async fn repo() -> (TempDir, Repository) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (temp_dir, Repository::new(pool))
    }
}
