use chrono::{DateTime, Utc};

use crate::domain::{PlayerRecord, RuleConfig};

/// Points the auto-clicker earned since the last persisted mutation:
/// `floor(min(elapsed, ttl) / speed)`.
pub fn accrued_points(record: &PlayerRecord, rules: &RuleConfig, now: DateTime<Utc>) -> i64 {
    if !record.auto_clicker.available || !record.auto_clicker.enabled {
        return 0;
    }

    let elapsed_secs = (now - record.played_at).num_seconds();
    if elapsed_secs <= 0 {
        return 0;
    }

    let window = elapsed_secs.min(rules.auto_clicker.ttl_secs);
    window / rules.auto_clicker.speed_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PlatformProfile, PlayerId};
    use chrono::{Duration, TimeZone};

    fn setup() -> (RuleConfig, PlayerRecord, DateTime<Utc>) {
        let rules = RuleConfig::embedded().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut record =
            PlayerRecord::register(PlayerId::new(1), PlatformProfile::default(), &rules, now);
        record.points = 1000;
        (rules, record, now)
    }

    #[test]
    fn test_requires_available_and_enabled() {
        let (rules, mut record, now) = setup();
        record.played_at = now - Duration::hours(1);
        assert_eq!(accrued_points(&record, &rules, now), 0);

        record.auto_clicker.available = true;
        assert_eq!(accrued_points(&record, &rules, now), 0);

        record.auto_clicker.enabled = true;
        assert!(accrued_points(&record, &rules, now) > 0);
    }

    #[test]
    fn test_accrual_within_ttl() {
        let (rules, mut record, now) = setup();
        record.auto_clicker.available = true;
        record.auto_clicker.enabled = true;
        record.played_at = now - Duration::hours(1);

        assert_eq!(
            accrued_points(&record, &rules, now),
            3600 / rules.auto_clicker.speed_secs
        );
    }

    #[test]
    fn test_accrual_capped_at_ttl() {
        let (rules, mut record, now) = setup();
        record.auto_clicker.available = true;
        record.auto_clicker.enabled = true;
        let cap = rules.auto_clicker.ttl_secs / rules.auto_clicker.speed_secs;

        record.played_at = now - Duration::seconds(rules.auto_clicker.ttl_secs);
        assert_eq!(accrued_points(&record, &rules, now), cap);

        record.played_at = now - Duration::seconds(rules.auto_clicker.ttl_secs) - Duration::hours(1);
        assert_eq!(accrued_points(&record, &rules, now), cap);

        record.played_at = now - Duration::days(365);
        assert_eq!(accrued_points(&record, &rules, now), cap);
    }

    #[test]
    fn test_non_positive_elapsed_is_zero() {
        let (rules, mut record, now) = setup();
        record.auto_clicker.available = true;
        record.auto_clicker.enabled = true;

        record.played_at = now;
        assert_eq!(accrued_points(&record, &rules, now), 0);

        record.played_at = now + Duration::minutes(10);
        assert_eq!(accrued_points(&record, &rules, now), 0);
    }
}
