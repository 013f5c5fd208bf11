use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::domain::{PlayerId, PlayerRecord, Quest, QuestState, QuestRules};

/// Verification delay for `(player, quest)`, stable across reads and
/// processes, within `[min, max]`.
pub fn verify_delay(player: PlayerId, quest: Quest, rules: &QuestRules) -> Duration {
    let digest = Sha256::digest(format!("{}:{}", player, quest).as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let spread = (rules.max_verify_delay_secs - rules.min_verify_delay_secs) as u64 + 1;
    let offset = u64::from_be_bytes(bytes) % spread;
    Duration::seconds(rules.min_verify_delay_secs + offset as i64)
}

/// In-progress quests whose verification window has passed.
pub fn solved(record: &PlayerRecord, rules: &QuestRules, now: DateTime<Utc>) -> Vec<Quest> {
    record
        .quests
        .iter()
        .filter(|(_, progress)| progress.state == QuestState::InProgress)
        .filter_map(|(quest, progress)| {
            let started_at = progress.started_at?;
            (now >= started_at + verify_delay(record.id, *quest, rules)).then_some(*quest)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PlatformProfile, QuestProgress, RuleConfig};
    use chrono::TimeZone;

    fn setup() -> (RuleConfig, PlayerRecord, DateTime<Utc>) {
        let rules = RuleConfig::embedded().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let record =
            PlayerRecord::register(PlayerId::new(77), PlatformProfile::default(), &rules, now);
        (rules, record, now)
    }

    #[test]
    fn test_delay_is_deterministic_and_bounded() {
        let (rules, _, _) = setup();
        for id in 1..200 {
            for quest in Quest::ALL {
                let a = verify_delay(PlayerId::new(id), quest, &rules.quests);
                let b = verify_delay(PlayerId::new(id), quest, &rules.quests);
                assert_eq!(a, b);
                assert!(a >= Duration::seconds(rules.quests.min_verify_delay_secs));
                assert!(a <= Duration::seconds(rules.quests.max_verify_delay_secs));
            }
        }
    }

    #[test]
    fn test_fixed_delay_when_bounds_match() {
        let (mut rules, _, _) = setup();
        rules.quests.min_verify_delay_secs = 60;
        rules.quests.max_verify_delay_secs = 60;
        assert_eq!(
            verify_delay(PlayerId::new(5), Quest::X, &rules.quests),
            Duration::seconds(60)
        );
    }

    #[test]
    fn test_solved_after_delay() {
        let (rules, mut record, now) = setup();
        record.quests.insert(
            Quest::Youtube,
            QuestProgress {
                state: QuestState::InProgress,
                started_at: Some(now),
            },
        );
        let delay = verify_delay(record.id, Quest::Youtube, &rules.quests);

        assert!(solved(&record, &rules.quests, now + delay - Duration::seconds(1)).is_empty());
        assert_eq!(solved(&record, &rules.quests, now + delay), vec![Quest::Youtube]);
    }

    #[test]
    fn test_ignores_not_started_and_solved() {
        let (rules, mut record, now) = setup();
        record.quests.insert(
            Quest::Telegram,
            QuestProgress {
                state: QuestState::Solved,
                started_at: Some(now - Duration::days(3)),
            },
        );
        record.quests.insert(Quest::X, QuestProgress::default());
        assert!(solved(&record, &rules.quests, now).is_empty());
    }
}
