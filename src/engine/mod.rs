//! Recomputation engine.
//!
//! Every time-dependent resource is derived from the last persisted state and
//! an explicit `now`; nothing here touches storage. The economy layer decides
//! what to persist.

pub mod auto_clicker;
pub mod daily_reward;
pub mod energy;
pub mod level;
pub mod quests;
pub mod recharge;

use chrono::{DateTime, Utc};

use crate::domain::{PlayerRecord, Quest, QuestState, RuleConfig};

pub use daily_reward::DailyRewardGrant;
pub use energy::{max_charge, EnergyAccrual};
pub use level::{check_next_level, LevelRequirement};

/// Midnight UTC of the day containing `at`.
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

/// The should-be state of a record at `now`, plus what changed to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct Recomputed {
    pub record: PlayerRecord,
    pub energy_gained: i64,
    pub auto_clicker_points: i64,
    pub daily_reward: Option<DailyRewardGrant>,
    pub solved_quests: Vec<Quest>,
    pub quest_points: i64,
    pub allowance_reset: bool,
}

impl Recomputed {
    pub fn points_granted(&self) -> i64 {
        self.auto_clicker_points
            + self.quest_points
            + self.daily_reward.map(|grant| grant.points).unwrap_or(0)
    }

    /// Whether a read-only caller must persist to realize a grant.
    pub fn has_grants(&self) -> bool {
        self.points_granted() > 0
            || self.daily_reward.is_some()
            || !self.solved_quests.is_empty()
            || self.allowance_reset
    }
}

/// Apply every accrual rule in a fixed order: energy, auto-clicker, quests,
/// daily reward, recharge allowance, then the derived view flags.
pub fn recompute(record: &PlayerRecord, rules: &RuleConfig, now: DateTime<Utc>) -> Recomputed {
    let mut next = record.clone();

    let accrual = energy::accrue(record, rules, now);
    next.tap.energy.charge = accrual.charge;
    next.tap.played_at = accrual.anchor;

    let auto_clicker_points = auto_clicker::accrued_points(record, rules, now);
    next.auto_clicker.last_accrued_points = auto_clicker_points;
    if auto_clicker_points > 0 {
        next.points += auto_clicker_points;
        next.played_at = now;
    }

    let solved_quests = quests::solved(record, &rules.quests, now);
    let mut quest_points = 0;
    for quest in &solved_quests {
        if let Some(progress) = next.quests.get_mut(quest) {
            progress.state = QuestState::Solved;
        }
        quest_points += rules.quests.reward(*quest);
    }
    next.points += quest_points;

    let daily_reward = daily_reward::due(record, rules, now);
    next.daily_reward.notify = daily_reward.is_some();
    if let Some(grant) = daily_reward {
        next.daily_reward.day = grant.day;
        next.daily_reward.last_received_at = now;
        next.points += grant.points;
    }

    let allowance_reset = recharge::allowance_reset_due(record, now);
    if allowance_reset {
        next.tap.energy.recharge_allowance_remaining = recharge::daily_allowance(record, rules);
        next.tap.energy.recharge_allowance_reset_at = now;
    }

    derive_flags(&mut next, rules);

    Recomputed {
        record: next,
        energy_gained: accrual.gained,
        auto_clicker_points,
        daily_reward,
        solved_quests,
        quest_points,
        allowance_reset,
    }
}

/// Refresh the view flags that are never trusted from storage.
pub fn derive_flags(record: &mut PlayerRecord, rules: &RuleConfig) {
    record.profile.is_channel_member = record
        .tasks
        .telegram_channels_joined
        .iter()
        .any(|channel| rules.allowed_channels.contains(channel));
    record.next_level_available = check_next_level(record, rules).is_ok();
}
