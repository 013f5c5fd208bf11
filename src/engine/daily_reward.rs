use chrono::{DateTime, Duration, Utc};

use super::start_of_day;
use crate::domain::{PlayerRecord, RuleConfig};

/// A daily reward that is due on this read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyRewardGrant {
    /// 1-based schedule day being granted.
    pub day: u32,
    pub points: i64,
}

/// Work out whether today's reward is still pending.
///
/// A reward received yesterday continues the streak (wrapping past the end of
/// the schedule); any older one restarts it at day one.
pub fn due(record: &PlayerRecord, rules: &RuleConfig, now: DateTime<Utc>) -> Option<DailyRewardGrant> {
    let start_of_today = start_of_day(now);
    let start_of_yesterday = start_of_today - Duration::days(1);
    let last = record.daily_reward.last_received_at;

    if last >= start_of_today {
        return None;
    }

    let schedule_len = rules.daily_rewards.len() as u32;
    let current = record.daily_reward.day;
    let day = if last >= start_of_yesterday {
        if current >= schedule_len {
            1
        } else {
            current + 1
        }
    } else {
        1
    };

    Some(DailyRewardGrant {
        day,
        points: rules.daily_rewards[(day - 1) as usize],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PlatformProfile, PlayerId};
    use chrono::TimeZone;

    fn setup() -> (RuleConfig, PlayerRecord, DateTime<Utc>) {
        let rules = RuleConfig::embedded().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 15, 30, 0).unwrap();
        let record =
            PlayerRecord::register(PlayerId::new(1), PlatformProfile::default(), &rules, now);
        (rules, record, now)
    }

    #[test]
    fn test_received_today_is_noop() {
        let (rules, mut record, now) = setup();
        record.daily_reward.day = 2;

        record.daily_reward.last_received_at = start_of_day(now);
        assert_eq!(due(&record, &rules, now), None);

        record.daily_reward.last_received_at = start_of_day(now) + Duration::hours(1);
        assert_eq!(due(&record, &rules, now), None);
    }

    #[test]
    fn test_received_yesterday_advances_streak() {
        let (rules, mut record, now) = setup();
        record.daily_reward.day = 2;

        record.daily_reward.last_received_at = start_of_day(now) - Duration::days(1);
        assert_eq!(
            due(&record, &rules, now),
            Some(DailyRewardGrant {
                day: 3,
                points: rules.daily_rewards[2]
            })
        );

        record.daily_reward.last_received_at = start_of_day(now) - Duration::seconds(1);
        assert_eq!(due(&record, &rules, now).map(|g| g.day), Some(3));
    }

    #[test]
    fn test_missed_day_resets_streak() {
        let (rules, mut record, now) = setup();
        record.daily_reward.day = 5;
        record.daily_reward.last_received_at =
            start_of_day(now) - Duration::days(1) - Duration::seconds(1);

        assert_eq!(
            due(&record, &rules, now),
            Some(DailyRewardGrant {
                day: 1,
                points: rules.daily_rewards[0]
            })
        );
    }

    #[test]
    fn test_every_schedule_day_pays_its_reward() {
        let (rules, mut record, now) = setup();
        for (idx, points) in rules.daily_rewards.iter().enumerate() {
            record.daily_reward.day = idx as u32;
            record.daily_reward.last_received_at =
                start_of_day(now) - Duration::days(1) + Duration::hours(1);

            let grant = due(&record, &rules, now).unwrap();
            assert_eq!(grant.day, idx as u32 + 1);
            assert_eq!(grant.points, *points);
        }
    }

    #[test]
    fn test_streak_wraps_after_last_day() {
        let (rules, mut record, now) = setup();
        record.daily_reward.day = rules.daily_rewards.len() as u32;
        record.daily_reward.last_received_at = start_of_day(now) - Duration::hours(2);

        let grant = due(&record, &rules, now).unwrap();
        assert_eq!(grant.day, 1);
        assert_eq!(grant.points, rules.daily_rewards[0]);
    }

    #[test]
    fn test_day_stays_in_schedule_bounds() {
        let (rules, mut record, now) = setup();
        let len = rules.daily_rewards.len() as u32;
        for day in 0..=(len + 3) {
            record.daily_reward.day = day;
            record.daily_reward.last_received_at = start_of_day(now) - Duration::hours(3);
            let grant = due(&record, &rules, now).unwrap();
            assert!((1..=len).contains(&grant.day));
        }
    }
}
