//! Level-ups, the auto-clicker, quests and channel tasks.

use chrono::{DateTime, Utc};
use tracing::info;

use super::EconomyService;
use crate::domain::{PlayerId, PlayerRecord, Quest, QuestProgress, QuestState};
use crate::engine::{check_next_level, LevelRequirement};
use crate::error::GameError;

impl EconomyService {
    /// Pay the next level's cost and advance one level. A referred player's
    /// referrer is credited with that level's sender bonus.
    pub async fn level_up(
        &self,
        id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        let (loaded, recomputed) = self.begin(id, now).await?;
        let mut record = recomputed.record;

        match check_next_level(&record, &self.rules) {
            Ok(()) => {}
            Err(LevelRequirement::Points {
                required,
                available,
            }) => {
                return Err(GameError::InsufficientPoints {
                    required,
                    available,
                })
            }
            Err(requirement) => return Err(GameError::LevelRequirementsNotMet(requirement)),
        }

        let cost = self.rules.level(record.level).next_level.cost;
        record.points -= cost;
        record.level = record.level.next();

        let record = self.commit(&loaded, record, now).await?;
        info!(player = %id, level = %record.level, cost, "Levelled up");

        if let Some(edge) = &record.profile.referral {
            let bonus = self.level_up_bonus(&record, record.level);
            self.credit_referrer(edge.referrer_id, bonus, false).await;
        }
        Ok(record)
    }

    /// Buy the auto-clicker; it starts enabled.
    pub async fn create_auto_clicker(
        &self,
        id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        let (loaded, recomputed) = self.begin(id, now).await?;
        let mut record = recomputed.record;
        let rules = &self.rules.auto_clicker;

        if record.auto_clicker.available {
            return Err(GameError::AutoClickerAlreadyActive);
        }
        if record.level < rules.min_level {
            return Err(GameError::AutoClickerLocked(rules.min_level));
        }
        if record.points < rules.cost {
            return Err(GameError::InsufficientPoints {
                required: rules.cost,
                available: record.points,
            });
        }

        record.points -= rules.cost;
        record.auto_clicker.available = true;
        record.auto_clicker.enabled = true;

        let record = self.commit(&loaded, record, now).await?;
        info!(player = %id, cost = rules.cost, "Bought auto-clicker");
        Ok(record)
    }

    /// Flip the auto-clicker on or off. Accrual restarts from this write.
    pub async fn toggle_auto_clicker(
        &self,
        id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        let (loaded, recomputed) = self.begin(id, now).await?;
        let mut record = recomputed.record;

        if !record.auto_clicker.available {
            return Err(GameError::AutoClickerNotActive);
        }
        record.auto_clicker.enabled = !record.auto_clicker.enabled;

        let record = self.commit(&loaded, record, now).await?;
        info!(player = %id, enabled = record.auto_clicker.enabled, "Toggled auto-clicker");
        Ok(record)
    }

    pub async fn start_quest(
        &self,
        id: PlayerId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        let quest: Quest = name
            .parse()
            .map_err(|_| GameError::UnknownQuest(name.to_string()))?;
        let (loaded, recomputed) = self.begin(id, now).await?;
        let mut record = recomputed.record;

        if record.quest(quest).state != QuestState::NotStarted {
            return Err(GameError::QuestAlreadyResolved);
        }
        record.quests.insert(
            quest,
            QuestProgress {
                state: QuestState::InProgress,
                started_at: Some(now),
            },
        );

        let record = self.commit(&loaded, record, now).await?;
        info!(player = %id, quest = %quest, "Started quest");
        Ok(record)
    }

    pub async fn join_channel(
        &self,
        id: PlayerId,
        channel: i64,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        self.update_channel(id, channel, true, now).await
    }

    pub async fn leave_channel(
        &self,
        id: PlayerId,
        channel: i64,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        self.update_channel(id, channel, false, now).await
    }

    async fn update_channel(
        &self,
        id: PlayerId,
        channel: i64,
        joined: bool,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        if !self.rules.allowed_channels.contains(&channel) {
            return Err(GameError::UnknownChannel(channel));
        }
        let (loaded, recomputed) = self.begin(id, now).await?;
        let mut record = recomputed.record;

        let channels = &mut record.tasks.telegram_channels_joined;
        if joined {
            channels.insert(channel);
        } else {
            channels.remove(&channel);
        }

        let record = self.commit(&loaded, record, now).await?;
        info!(player = %id, channel, joined, "Updated channel membership");
        Ok(record)
    }
}
