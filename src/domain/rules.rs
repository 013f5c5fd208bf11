//! Game rule tables, loaded once per process and shared read-only.

use super::player::Quest;
use super::primitives::Level;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const EMBEDDED_RULES: &str = include_str!("rules.json");

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse rules: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid rules: {0}")]
    Invalid(String),
}

/// Immutable, versioned table of game constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    #[serde(default)]
    pub version: u32,
    pub taps_base_energy_charge: i64,
    /// Indexed by level.
    pub taps: Vec<LevelRules>,
    pub daily_rewards: Vec<i64>,
    pub auto_clicker: AutoClickerRules,
    /// Referral bonus matrix, indexed by level.
    pub referral: Vec<ReferralBonus>,
    pub quests: QuestRules,
    #[serde(default)]
    pub allowed_channels: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRules {
    pub boost_cost: i64,
    pub boost_available: u32,
    pub energy: EnergyRules,
    pub next_level: NextLevelRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyRules {
    pub charge_time_segment_ms: i64,
    pub boost_charge: i64,
    pub boost_charge_cost: i64,
    pub boost_charge_available: u32,
    pub recharge_available: u32,
    pub recharge_available_after_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextLevelRules {
    pub cost: i64,
    pub tasks: LevelTasks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelTasks {
    #[serde(default)]
    pub telegram_channels: Vec<i64>,
    #[serde(default)]
    pub referrals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoClickerRules {
    pub speed_secs: i64,
    pub ttl_secs: i64,
    pub cost: i64,
    pub min_level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusSplit {
    pub plain: i64,
    pub premium: i64,
}

impl BonusSplit {
    pub fn for_premium(&self, is_premium: bool) -> i64 {
        if is_premium {
            self.premium
        } else {
            self.plain
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralBonus {
    pub sender: BonusSplit,
    pub recipient: BonusSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestRules {
    pub telegram: i64,
    pub youtube: i64,
    pub x: i64,
    pub min_verify_delay_secs: i64,
    pub max_verify_delay_secs: i64,
}

impl QuestRules {
    pub fn reward(&self, quest: Quest) -> i64 {
        match quest {
            Quest::Telegram => self.telegram,
            Quest::Youtube => self.youtube,
            Quest::X => self.x,
        }
    }
}

impl RuleConfig {
    /// Rules compiled into the binary.
    pub fn embedded() -> Result<Self, RulesError> {
        Self::from_json_str(EMBEDDED_RULES)
    }

    pub fn from_path(path: &Path) -> Result<Self, RulesError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RulesError> {
        let rules: RuleConfig = serde_json::from_str(raw)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reject tables that would leave a formula undefined.
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.taps.is_empty() {
            return Err(RulesError::Invalid("taps must not be empty".to_string()));
        }
        if self.taps.len() > u8::MAX as usize {
            return Err(RulesError::Invalid("too many levels".to_string()));
        }
        if self.daily_rewards.is_empty() {
            return Err(RulesError::Invalid(
                "dailyRewards must not be empty".to_string(),
            ));
        }
        if self.referral.len() < self.taps.len() {
            return Err(RulesError::Invalid(format!(
                "referral matrix has {} rows, need {}",
                self.referral.len(),
                self.taps.len()
            )));
        }
        if self.taps_base_energy_charge <= 0 {
            return Err(RulesError::Invalid(
                "tapsBaseEnergyCharge must be positive".to_string(),
            ));
        }
        for (idx, level) in self.taps.iter().enumerate() {
            if level.energy.charge_time_segment_ms <= 0 {
                return Err(RulesError::Invalid(format!(
                    "taps[{idx}].energy.chargeTimeSegmentMs must be positive"
                )));
            }
        }
        if self.auto_clicker.speed_secs <= 0 || self.auto_clicker.ttl_secs < 0 {
            return Err(RulesError::Invalid(
                "autoClicker speed must be positive and ttl non-negative".to_string(),
            ));
        }
        if self.quests.min_verify_delay_secs < 0
            || self.quests.max_verify_delay_secs < self.quests.min_verify_delay_secs
        {
            return Err(RulesError::Invalid(
                "quest verify delays must satisfy 0 <= min <= max".to_string(),
            ));
        }
        Ok(())
    }

    /// Rules for `level`; levels beyond the table use the top row.
    pub fn level(&self, level: Level) -> &LevelRules {
        &self.taps[level.index().min(self.taps.len() - 1)]
    }

    /// Highest level the table defines.
    pub fn max_level(&self) -> Level {
        Level::new((self.taps.len() - 1) as u8)
    }

    pub fn referral_bonus(&self, level: Level) -> Option<&ReferralBonus> {
        self.referral.get(level.index())
    }

    pub fn level_count(&self) -> usize {
        self.taps.len()
    }
}
