//! Tapping, boost purchases and energy recharges.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, info};

use super::EconomyService;
use crate::domain::player::bump_per_level;
use crate::domain::{PlayerId, PlayerRecord};
use crate::engine::max_charge;
use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostKind {
    /// One more point per tap.
    Tap,
    /// Larger energy tank.
    Energy,
}

impl FromStr for BoostKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tap" => Ok(BoostKind::Tap),
            "energy" => Ok(BoostKind::Energy),
            _ => Err(()),
        }
    }
}

fn charge_points(record: &mut PlayerRecord, cost: i64) -> Result<(), GameError> {
    if record.points < cost {
        return Err(GameError::InsufficientPoints {
            required: cost,
            available: record.points,
        });
    }
    record.points -= cost;
    Ok(())
}

impl EconomyService {
    /// Spend energy on up to `count` taps.
    ///
    /// Requests beyond what the current charge affords are truncated, never
    /// rejected.
    pub async fn tap(
        &self,
        id: PlayerId,
        count: u64,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        let (loaded, recomputed) = self.begin(id, now).await?;
        let mut record = recomputed.record;

        let per_tap = record.tap.points_per_tap.max(1);
        let affordable = (record.tap.energy.charge / per_tap).max(0) as u64;
        let taps = count.min(affordable) as i64;
        if (taps as u64) < count {
            debug!(player = %id, requested = count, taps, "Truncated taps to available energy");
        }

        record.tap.energy.charge -= taps * per_tap;
        record.tap.count += taps;
        record.points += taps * per_tap;

        let record = self.commit(&loaded, record, now).await?;
        debug!(player = %id, taps, points = record.points, "Tapped");
        Ok(record)
    }

    pub async fn purchase_boost(
        &self,
        id: PlayerId,
        kind: BoostKind,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        let (loaded, recomputed) = self.begin(id, now).await?;
        let mut record = recomputed.record;
        let level = record.level;
        let level_rules = self.rules.level(level);

        match kind {
            BoostKind::Tap => {
                if record.tap_boosts(level) >= level_rules.boost_available {
                    return Err(GameError::NoBoostSlotsLeft);
                }
                charge_points(&mut record, level_rules.boost_cost)?;
                bump_per_level(&mut record.tap.boost_per_level, level);
                record.tap.points_per_tap += 1;
            }
            BoostKind::Energy => {
                if record.energy_boosts(level) >= level_rules.energy.boost_charge_available {
                    return Err(GameError::NoBoostSlotsLeft);
                }
                charge_points(&mut record, level_rules.energy.boost_charge_cost)?;
                bump_per_level(&mut record.tap.energy.boost_per_level, level);
                let max = max_charge(&record, &self.rules);
                record.tap.energy.charge = (record.tap.energy.charge + level_rules.energy.boost_charge).min(max);
            }
        }

        let record = self.commit(&loaded, record, now).await?;
        info!(player = %id, kind = ?kind, level = %level, points = record.points, "Purchased boost");
        Ok(record)
    }

    /// Refill the tank to its maximum, once per allowance unit and no sooner
    /// than the level's minimum delay after the previous refill.
    pub async fn recharge_energy(
        &self,
        id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        let (loaded, recomputed) = self.begin(id, now).await?;
        let mut record = recomputed.record;
        let energy_rules = &self.rules.level(record.level).energy;

        if record.tap.energy.recharge_allowance_remaining == 0 {
            return Err(GameError::NoRechargeAllowance);
        }
        if let Some(last) = record.tap.energy.last_recharged_at {
            let ready_at = last + Duration::seconds(energy_rules.recharge_available_after_secs);
            if now < ready_at {
                return Err(GameError::RechargeTooSoon {
                    retry_after_secs: (ready_at - now).num_seconds().max(1),
                });
            }
        }

        record.tap.energy.recharge_allowance_remaining -= 1;
        record.tap.energy.last_recharged_at = Some(now);
        record.tap.energy.charge = max_charge(&record, &self.rules);
        record.tap.played_at = now;

        let record = self.commit(&loaded, record, now).await?;
        info!(
            player = %id,
            remaining = record.tap.energy.recharge_allowance_remaining,
            "Recharged energy"
        );
        Ok(record)
    }
}
