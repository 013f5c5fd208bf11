//! Domain types for the tap economy.
//!
//! This module provides:
//! - Identity primitives: PlayerId, Level
//! - The per-player document (`PlayerRecord`) and its nested state
//! - The immutable rule tables (`RuleConfig`)
//! - Read-only leaderboard views

pub mod leaderboard;
pub mod player;
pub mod primitives;
pub mod rules;

pub use leaderboard::{Friend, LeaderboardPage, LeaderboardRow, LeaderboardTab};
pub use player::{
    AccountStatus, AutoClickerState, DailyRewardState, EnergyState, PlatformProfile, PlayerRecord,
    Profile, Quest, QuestProgress, QuestState, ReferralEdge, TapState, Tasks,
};
pub use primitives::{Level, PlayerId};
pub use rules::{
    AutoClickerRules, BonusSplit, EnergyRules, LevelRules, LevelTasks, NextLevelRules,
    QuestRules, ReferralBonus, RuleConfig, RulesError,
};
