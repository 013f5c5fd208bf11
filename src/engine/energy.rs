use chrono::{DateTime, Duration, Utc};

use crate::domain::{PlayerRecord, RuleConfig};

/// An idle gap this long always ends with a full tank.
pub fn full_tank_after() -> Duration {
    Duration::hours(24)
}

/// Energy state after accrual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyAccrual {
    pub charge: i64,
    /// New accrual anchor for `tap.played_at`.
    pub anchor: DateTime<Utc>,
    pub gained: i64,
}

/// `base + Σ boostCharge[level] * boostsBought[level]`.
pub fn max_charge(record: &PlayerRecord, rules: &RuleConfig) -> i64 {
    record
        .tap
        .energy
        .boost_per_level
        .iter()
        .zip(rules.taps.iter())
        .fold(rules.taps_base_energy_charge, |acc, (bought, level)| {
            acc + level.energy.boost_charge * i64::from(*bought)
        })
}

/// Accrue charge for the time elapsed since the anchor.
///
/// Whole segments are credited and the anchor moves forward by exactly the
/// credited time, so a partial segment carries into the next read. A full
/// tank moves the anchor to `now`.
pub fn accrue(record: &PlayerRecord, rules: &RuleConfig, now: DateTime<Utc>) -> EnergyAccrual {
    let max = max_charge(record, rules);
    let charge = record.tap.energy.charge;
    let anchor = record.tap.played_at;

    if charge >= max {
        return EnergyAccrual {
            charge: max,
            anchor: anchor.max(now),
            gained: 0,
        };
    }

    let elapsed = now - anchor;
    if elapsed <= Duration::zero() {
        return EnergyAccrual {
            charge,
            anchor,
            gained: 0,
        };
    }

    if elapsed >= full_tank_after() {
        return EnergyAccrual {
            charge: max,
            anchor: now,
            gained: max - charge,
        };
    }

    let segment_ms = rules.level(record.level).energy.charge_time_segment_ms;
    let units = elapsed.num_milliseconds() / segment_ms;
    if units == 0 {
        return EnergyAccrual {
            charge,
            anchor,
            gained: 0,
        };
    }

    let next = (charge + units).min(max);
    let anchor = if next == max {
        now
    } else {
        anchor + Duration::milliseconds(units * segment_ms)
    };

    EnergyAccrual {
        charge: next,
        anchor,
        gained: next - charge,
    }
}
