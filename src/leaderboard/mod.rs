//! Leaderboard Ranking Engine.
//!
//! Points come from the document store. Rank order for the level and global
//! views comes from the ranking index; the friends view is ranked from the
//! fetched page itself.

mod ranks;

pub use ranks::{interpolate_friend_ranks, restore_order};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::db::{RefereeRow, Repository};
use crate::domain::{
    AccountStatus, Friend, Level, LeaderboardPage, LeaderboardRow, LeaderboardTab, PlayerId,
    PlayerRecord, RuleConfig,
};
use crate::engine;
use crate::error::GameError;
use crate::ranking::{RankingStore, Scope};

pub struct LeaderboardEngine {
    repo: Arc<Repository>,
    ranking: Arc<dyn RankingStore>,
    rules: Arc<RuleConfig>,
}

impl LeaderboardEngine {
    pub fn new(
        repo: Arc<Repository>,
        ranking: Arc<dyn RankingStore>,
        rules: Arc<RuleConfig>,
    ) -> Self {
        Self {
            repo,
            ranking,
            rules,
        }
    }

    /// One page of `tab` plus the requester's own row. The requester's
    /// points include any grant pending at `now`; nothing is persisted.
    pub async fn read(
        &self,
        id: PlayerId,
        tab: LeaderboardTab,
        limit: u64,
        skip: u64,
        now: DateTime<Utc>,
    ) -> Result<LeaderboardPage, GameError> {
        let loaded = self.load_active(id).await?;
        let record = engine::recompute(&loaded, &self.rules, now).record;
        let mut me = row_for(&record);

        match tab {
            LeaderboardTab::Friends => {
                let mut list: Vec<LeaderboardRow> = self
                    .repo
                    .ranked_referees(id, limit, skip)
                    .await?
                    .into_iter()
                    .map(row_from_referee)
                    .collect();
                interpolate_friend_ranks(&mut me, &mut list, skip);
                let total = self.repo.count_ranked_referees(id).await?;
                Ok(LeaderboardPage { me, list, total })
            }
            LeaderboardTab::Level => {
                let level = record.level;
                self.read_indexed(me, Scope::Level(level), Some(level), limit, skip)
                    .await
            }
            LeaderboardTab::Global => {
                self.read_indexed(me, Scope::Global, None, limit, skip)
                    .await
            }
        }
    }

    async fn read_indexed(
        &self,
        mut me: LeaderboardRow,
        scope: Scope,
        level: Option<Level>,
        limit: u64,
        skip: u64,
    ) -> Result<LeaderboardPage, GameError> {
        me.rank = if me.nickname.is_empty() {
            0
        } else {
            self.ranking
                .descending_rank(scope, me.player_id)
                .await?
                .unwrap_or(0)
        };

        let ids = if limit == 0 {
            Vec::new()
        } else {
            self.ranking.descending_range(scope, skip, limit).await?
        };
        let rows = self.repo.leaderboard_rows(&ids).await?;
        let list = restore_order(&ids, rows, skip, level);
        let total = self.repo.count_rankable(level).await?;

        Ok(LeaderboardPage { me, list, total })
    }

    /// Referees of `id` with the referral points each has earned them, and
    /// the referee count.
    pub async fn read_friends(
        &self,
        id: PlayerId,
        limit: u64,
        skip: u64,
    ) -> Result<(Vec<Friend>, i64), GameError> {
        self.load_active(id).await?;
        let friends = self
            .repo
            .referees(id, limit, skip)
            .await?
            .into_iter()
            .map(|referee| Friend {
                points: earned_from(&self.rules, &referee),
                nickname: referee.nickname,
                level: referee.level,
                is_premium: referee.is_premium,
            })
            .collect();
        let total = self.repo.count_referees(id).await?;
        Ok((friends, total))
    }

    /// Flush every scope and re-index all rankable players from the document
    /// store. Returns the number of players indexed.
    pub async fn rebuild_index(&self) -> Result<usize, GameError> {
        self.ranking.flush(Scope::Global).await?;
        for level in 0..self.rules.level_count() {
            self.ranking
                .flush(Scope::Level(Level::new(level as u8)))
                .await?;
        }

        let scores = self.repo.rankable_scores().await?;
        for (player, level, points) in &scores {
            self.ranking
                .upsert_score(Scope::Global, *player, *points)
                .await?;
            self.ranking
                .upsert_score(Scope::Level(*level), *player, *points)
                .await?;
        }

        info!(players = scores.len(), "Ranking index rebuilt");
        Ok(scores.len())
    }

    async fn load_active(&self, id: PlayerId) -> Result<PlayerRecord, GameError> {
        let record = self
            .repo
            .get_player(id)
            .await?
            .ok_or(GameError::NoSuchPlayer)?;
        match record.status() {
            AccountStatus::Active => Ok(record),
            AccountStatus::Banned => Err(GameError::Banned),
            AccountStatus::Ghost => Err(GameError::Ghost),
        }
    }
}

fn row_for(record: &PlayerRecord) -> LeaderboardRow {
    LeaderboardRow {
        player_id: record.id,
        nickname: record.profile.nickname.clone().unwrap_or_default(),
        level: record.level,
        is_premium: record.is_premium(),
        points: record.points,
        rank: 0,
    }
}

fn row_from_referee(referee: RefereeRow) -> LeaderboardRow {
    LeaderboardRow {
        player_id: referee.player_id,
        nickname: referee.nickname.unwrap_or_default(),
        level: referee.level,
        is_premium: referee.is_premium,
        points: referee.points,
        rank: 0,
    }
}

/// Σ sender bonus for levels `0..=referee.level`.
fn earned_from(rules: &RuleConfig, referee: &RefereeRow) -> i64 {
    rules
        .referral
        .iter()
        .take(referee.level.index() + 1)
        .map(|bonus| bonus.sender.for_premium(referee.is_premium))
        .sum()
}
