//! One-hop referral credits.
//!
//! A referrer is credited at two points only: when a referee first sets a
//! nickname (level-0 bonus, both sides) and when a referee levels up.

use serde::Serialize;
use tracing::{info, warn};

use super::EconomyService;
use crate::domain::{Level, PlayerId, PlayerRecord};

/// Outcome of the level-0 referral settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSettlement {
    pub referrer_id: PlayerId,
    /// Credited to the player who set the nickname.
    pub recipient_bonus: i64,
    /// Credited to the referrer.
    pub sender_bonus: i64,
    /// False when the referrer could not be credited (disabled, gone, or the
    /// write failed).
    pub referrer_credited: bool,
}

impl EconomyService {
    /// The bonuses due when `record` first sets a nickname, if referred.
    pub(super) fn referral_settlement(&self, record: &PlayerRecord) -> Option<ReferralSettlement> {
        let edge = record.profile.referral.as_ref()?;
        let bonus = self.rules.referral_bonus(Level::ZERO)?;
        Some(ReferralSettlement {
            referrer_id: edge.referrer_id,
            recipient_bonus: bonus.recipient.for_premium(record.is_premium()),
            sender_bonus: bonus.sender.for_premium(record.is_premium()),
            referrer_credited: false,
        })
    }

    /// Credit the referrer side of a settlement and count the referral.
    pub(super) async fn settle_with_referrer(
        &self,
        mut settlement: ReferralSettlement,
    ) -> ReferralSettlement {
        settlement.referrer_credited = self
            .credit_referrer(settlement.referrer_id, settlement.sender_bonus, true)
            .await;
        settlement
    }

    /// The sender bonus for a referee reaching `level`.
    pub(super) fn level_up_bonus(&self, record: &PlayerRecord, level: Level) -> i64 {
        self.rules
            .referral_bonus(level)
            .map(|bonus| bonus.sender.for_premium(record.is_premium()))
            .unwrap_or(0)
    }

    /// Atomically credit `referrer` and re-index them. Returns whether an
    /// active referrer was credited.
    ///
    /// Runs after the referee's own write has committed, so a failure here is
    /// logged and reported as not credited rather than failing the caller.
    pub(super) async fn credit_referrer(
        &self,
        referrer: PlayerId,
        points: i64,
        count_referral: bool,
    ) -> bool {
        if points == 0 && !count_referral {
            return false;
        }

        match self
            .repo
            .credit_referrer(referrer, points, count_referral)
            .await
        {
            Ok(Some(credited)) => {
                info!(
                    referrer = %referrer,
                    points,
                    total = credited.points,
                    "Credited referrer"
                );
                self.ranking
                    .propagate(referrer, credited.level, credited.points)
                    .await;
                true
            }
            Ok(None) => {
                warn!(referrer = %referrer, points, "Referrer inactive; bonus not credited");
                false
            }
            Err(err) => {
                warn!(
                    referrer = %referrer,
                    points,
                    count_referral,
                    "Referrer credit failed: {err}"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{harness, start, Harness};
    use crate::domain::{Level, PlatformProfile, PlayerId};
    use crate::error::GameError;
    use crate::ranking::Scope;

    /// Make every write to player `id` fail.
    async fn block_writes(h: &Harness, id: i64) {
        let sql = format!(
            "CREATE TRIGGER block_writes BEFORE UPDATE ON players WHEN OLD.id = {id} \
             BEGIN SELECT RAISE(ABORT, 'writes blocked'); END"
        );
        sqlx::query(&sql).execute(&h.pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_settlement_fires_once() {
        let h = harness().await;
        h.player(1, 1000).await;
        h.service.set_nickname(PlayerId::new(1), "rooty", start()).await.unwrap();
        let (referee, _) = h
            .service
            .get_or_create_player(PlayerId::new(2), PlatformProfile::default(), Some("1"), start())
            .await
            .unwrap();

        let bonus = h.rules.referral[0];
        let (record, _, settlement) = h
            .service
            .set_nickname(PlayerId::new(2), "kiddo", start())
            .await
            .unwrap();
        let settlement = settlement.unwrap();
        assert!(settlement.referrer_credited);
        assert_eq!(settlement.recipient_bonus, bonus.recipient.plain);
        assert_eq!(record.points, referee.points + bonus.recipient.plain);

        let referrer = h.repo.get_player(PlayerId::new(1)).await.unwrap().unwrap();
        assert_eq!(referrer.points, 1000 + bonus.sender.plain);
        assert_eq!(referrer.referral_count, 1);
        assert_eq!(referrer.referral_points, bonus.sender.plain);
        assert_eq!(
            h.ranking.score(Scope::Global, PlayerId::new(1)).await,
            Some(referrer.points)
        );

        assert!(matches!(
            h.service.set_nickname(PlayerId::new(2), "another", start()).await,
            Err(GameError::NicknameAlreadySet)
        ));
        let referrer_after = h.repo.get_player(PlayerId::new(1)).await.unwrap().unwrap();
        assert_eq!(referrer_after.points, referrer.points);
        assert_eq!(referrer_after.referral_count, 1);
    }

    #[tokio::test]
    async fn test_premium_referee_earns_premium_bonus() {
        let h = harness().await;
        h.player(1, 0).await;
        h.service.set_nickname(PlayerId::new(1), "rooty", start()).await.unwrap();
        let platform = PlatformProfile {
            is_premium: true,
            ..PlatformProfile::default()
        };
        h.service
            .get_or_create_player(PlayerId::new(2), platform, Some("1"), start())
            .await
            .unwrap();

        let (_, _, settlement) = h
            .service
            .set_nickname(PlayerId::new(2), "fancy", start())
            .await
            .unwrap();
        let settlement = settlement.unwrap();
        assert_eq!(settlement.recipient_bonus, h.rules.referral[0].recipient.premium);
        assert_eq!(settlement.sender_bonus, h.rules.referral[0].sender.premium);
    }

    #[tokio::test]
    async fn test_banned_referrer_is_not_credited() {
        let h = harness().await;
        h.player(1, 0).await;
        h.service.set_nickname(PlayerId::new(1), "rooty", start()).await.unwrap();
        h.service
            .get_or_create_player(PlayerId::new(2), PlatformProfile::default(), Some("1"), start())
            .await
            .unwrap();
        h.repo.set_player_status(PlayerId::new(1), true, false).await.unwrap();

        let (_, _, settlement) = h
            .service
            .set_nickname(PlayerId::new(2), "kiddo", start())
            .await
            .unwrap();
        assert!(!settlement.unwrap().referrer_credited);
    }

    #[tokio::test]
    async fn test_failed_referrer_credit_keeps_nickname() {
        let h = harness().await;
        h.player(1, 1000).await;
        h.service.set_nickname(PlayerId::new(1), "rooty", start()).await.unwrap();
        h.service
            .get_or_create_player(PlayerId::new(2), PlatformProfile::default(), Some("1"), start())
            .await
            .unwrap();
        block_writes(&h, 1).await;

        let (record, _, settlement) = h
            .service
            .set_nickname(PlayerId::new(2), "kiddo", start())
            .await
            .unwrap();
        assert!(!settlement.unwrap().referrer_credited);
        assert_eq!(record.profile.nickname.as_deref(), Some("kiddo"));

        let referrer = h.repo.get_player(PlayerId::new(1)).await.unwrap().unwrap();
        assert_eq!(referrer.points, 1000);
        assert_eq!(referrer.referral_count, 0);
    }

    #[tokio::test]
    async fn test_failed_referrer_credit_keeps_level_up() {
        let h = harness().await;
        h.player(1, 0).await;
        h.service.set_nickname(PlayerId::new(1), "rooty", start()).await.unwrap();
        h.service
            .get_or_create_player(PlayerId::new(2), PlatformProfile::default(), Some("1"), start())
            .await
            .unwrap();
        let cost = h.rules.taps[0].next_level.cost;
        h.update(2, |r| r.points = cost).await;
        block_writes(&h, 1).await;
        let before = h.repo.get_player(PlayerId::new(1)).await.unwrap().unwrap();

        let record = h.service.level_up(PlayerId::new(2), start()).await.unwrap();
        assert_eq!(record.level, Level::new(1));
        let stored = h.repo.get_player(PlayerId::new(2)).await.unwrap().unwrap();
        assert_eq!(stored.level, Level::new(1));
        let after = h.repo.get_player(PlayerId::new(1)).await.unwrap().unwrap();
        assert_eq!(after.points, before.points);
    }
}
