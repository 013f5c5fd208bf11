use serde::Serialize;

use crate::domain::{PlayerRecord, RuleConfig};

/// The first unmet condition for the next level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "requirement")]
pub enum LevelRequirement {
    MaxLevel,
    Points { required: i64, available: i64 },
    Channels { missing: Vec<i64> },
    Referrals { required: u32, available: i64 },
}

impl std::fmt::Display for LevelRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelRequirement::MaxLevel => f.write_str("already at the top level"),
            LevelRequirement::Points {
                required,
                available,
            } => write!(f, "needs {required} points, has {available}"),
            LevelRequirement::Channels { missing } => {
                write!(f, "channels not joined: {missing:?}")
            }
            LevelRequirement::Referrals {
                required,
                available,
            } => write!(f, "needs {required} referrals, has {available}"),
        }
    }
}

/// Check every requirement for the level above the player's current one.
pub fn check_next_level(record: &PlayerRecord, rules: &RuleConfig) -> Result<(), LevelRequirement> {
    if record.level >= rules.max_level() {
        return Err(LevelRequirement::MaxLevel);
    }

    let next = &rules.level(record.level).next_level;
    if record.points < next.cost {
        return Err(LevelRequirement::Points {
            required: next.cost,
            available: record.points,
        });
    }

    let missing: Vec<i64> = next
        .tasks
        .telegram_channels
        .iter()
        .filter(|channel| !record.tasks.telegram_channels_joined.contains(channel))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(LevelRequirement::Channels { missing });
    }

    if record.referral_count < i64::from(next.tasks.referrals) {
        return Err(LevelRequirement::Referrals {
            required: next.tasks.referrals,
            available: record.referral_count,
        });
    }

    Ok(())
}
