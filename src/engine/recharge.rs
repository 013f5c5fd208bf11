use chrono::{DateTime, Utc};

use crate::domain::{PlayerRecord, RuleConfig};

/// The recharge allowance refills once per UTC calendar day.
pub fn allowance_reset_due(record: &PlayerRecord, now: DateTime<Utc>) -> bool {
    now.date_naive() > record.tap.energy.recharge_allowance_reset_at.date_naive()
}

/// Full daily allowance for the player's current level.
pub fn daily_allowance(record: &PlayerRecord, rules: &RuleConfig) -> u32 {
    rules.level(record.level).energy.recharge_available
}
