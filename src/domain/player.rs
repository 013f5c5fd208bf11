//! The per-player document and its parts.

use super::primitives::{Level, PlayerId};
use super::rules::RuleConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use uuid::Uuid;

/// One record per player; the authoritative source of points and level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub points: i64,
    pub level: Level,
    /// Last persisted mutation; anchors auto-clicker accrual.
    pub played_at: DateTime<Utc>,
    pub profile: Profile,
    pub tap: TapState,
    pub daily_reward: DailyRewardState,
    pub auto_clicker: AutoClickerState,
    #[serde(default)]
    pub tasks: Tasks,
    #[serde(default)]
    pub quests: BTreeMap<Quest, QuestProgress>,
    #[serde(default)]
    pub referral_count: i64,
    #[serde(default)]
    pub referral_points: i64,
    /// Derived on every recompute.
    #[serde(default)]
    pub next_level_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub nickname: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub ghost: bool,
    #[serde(default)]
    pub referral: Option<ReferralEdge>,
    pub platform: PlatformProfile,
    /// Id of the most recently issued session token.
    #[serde(default)]
    pub jti: Option<Uuid>,
    /// Derived on every recompute.
    #[serde(default)]
    pub is_channel_member: bool,
}

/// Identity details supplied by the messaging platform at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformProfile {
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub username: String,
}

/// Who referred this player. Set at most once and never repointed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralEdge {
    pub referrer_id: PlayerId,
    pub referrer_nickname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapState {
    pub count: i64,
    pub points_per_tap: i64,
    /// Tap boosts bought, per level.
    pub boost_per_level: Vec<u32>,
    pub energy: EnergyState,
    /// Energy accrual anchor.
    pub played_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyState {
    pub charge: i64,
    /// Energy boosts bought, per level.
    pub boost_per_level: Vec<u32>,
    pub recharge_allowance_remaining: u32,
    pub recharge_allowance_reset_at: DateTime<Utc>,
    #[serde(default)]
    pub last_recharged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRewardState {
    /// 1-based position in the reward schedule.
    pub day: u32,
    pub last_received_at: DateTime<Utc>,
    /// Set when the current read granted the reward.
    #[serde(default)]
    pub notify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoClickerState {
    pub available: bool,
    pub enabled: bool,
    #[serde(default)]
    pub last_accrued_points: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tasks {
    #[serde(default)]
    pub telegram_channels_joined: BTreeSet<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quest {
    Telegram,
    Youtube,
    X,
}

impl Quest {
    pub const ALL: [Quest; 3] = [Quest::Telegram, Quest::Youtube, Quest::X];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quest::Telegram => "telegram",
            Quest::Youtube => "youtube",
            Quest::X => "x",
        }
    }
}

impl std::fmt::Display for Quest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quest {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "telegram" => Ok(Quest::Telegram),
            "youtube" => Ok(Quest::Youtube),
            "x" => Ok(Quest::X),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestState {
    #[default]
    NotStarted,
    InProgress,
    Solved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestProgress {
    pub state: QuestState,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// Soft-disable state; disabled players are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Banned,
    Ghost,
}

impl PlayerRecord {
    /// Fresh record for a first-contact player. Day one of the daily reward
    /// is granted immediately.
    pub fn register(
        id: PlayerId,
        platform: PlatformProfile,
        rules: &RuleConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let levels = rules.level_count();
        PlayerRecord {
            id,
            points: rules.daily_rewards[0],
            level: Level::ZERO,
            played_at: now,
            profile: Profile {
                nickname: None,
                created_at: now,
                updated_at: now,
                banned: false,
                ghost: false,
                referral: None,
                platform,
                jti: None,
                is_channel_member: false,
            },
            tap: TapState {
                count: 0,
                points_per_tap: 1,
                boost_per_level: vec![0; levels],
                energy: EnergyState {
                    charge: rules.taps_base_energy_charge,
                    boost_per_level: vec![0; levels],
                    recharge_allowance_remaining: rules.level(Level::ZERO).energy.recharge_available,
                    recharge_allowance_reset_at: now,
                    last_recharged_at: None,
                },
                played_at: now,
            },
            daily_reward: DailyRewardState {
                day: 1,
                last_received_at: now,
                notify: true,
            },
            auto_clicker: AutoClickerState::default(),
            tasks: Tasks::default(),
            quests: BTreeMap::new(),
            referral_count: 0,
            referral_points: 0,
            next_level_available: false,
        }
    }

    pub fn status(&self) -> AccountStatus {
        if self.profile.ghost {
            AccountStatus::Ghost
        } else if self.profile.banned {
            AccountStatus::Banned
        } else {
            AccountStatus::Active
        }
    }

    pub fn is_premium(&self) -> bool {
        self.profile.platform.is_premium
    }

    pub fn quest(&self, quest: Quest) -> QuestProgress {
        self.quests.get(&quest).copied().unwrap_or_default()
    }

    /// Tap boosts bought at `level`.
    pub fn tap_boosts(&self, level: Level) -> u32 {
        self.tap
            .boost_per_level
            .get(level.index())
            .copied()
            .unwrap_or(0)
    }

    /// Energy boosts bought at `level`.
    pub fn energy_boosts(&self, level: Level) -> u32 {
        self.tap
            .energy
            .boost_per_level
            .get(level.index())
            .copied()
            .unwrap_or(0)
    }
}

/// Increment a per-level counter, growing the vector if the rule table did.
pub(crate) fn bump_per_level(counters: &mut Vec<u32>, level: Level) {
    if counters.len() <= level.index() {
        counters.resize(level.index() + 1, 0);
    }
    counters[level.index()] += 1;
}
