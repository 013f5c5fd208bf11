//! Registration, session tokens and nicknames.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

use super::{referral::ReferralSettlement, stamp, EconomyService};
use crate::db::is_unique_violation;
use crate::domain::{AccountStatus, PlatformProfile, PlayerId, PlayerRecord, ReferralEdge};
use crate::engine;
use crate::error::GameError;
use crate::token::TokenError;

const NICKNAME_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9]{3,31}$";

/// Letter first, then letters or digits, 4 to 32 characters.
pub fn validate_nickname(nickname: &str) -> Result<(), GameError> {
    static NICKNAME: OnceLock<Option<Regex>> = OnceLock::new();
    let valid = NICKNAME
        .get_or_init(|| Regex::new(NICKNAME_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(nickname));
    if valid {
        Ok(())
    } else {
        Err(GameError::InvalidNickname)
    }
}

impl EconomyService {
    /// Load or register a player and issue a fresh session token.
    ///
    /// `referral_code` is the referrer's numeric id; it only attaches on
    /// registration and only to an active, named referrer other than the
    /// player.
    pub async fn get_or_create_player(
        &self,
        id: PlayerId,
        platform: PlatformProfile,
        referral_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(PlayerRecord, String), GameError> {
        if self.repo.get_player(id).await?.is_none() {
            let mut record = PlayerRecord::register(id, platform, &self.rules, now);
            record.profile.referral = self.resolve_referral(id, referral_code).await?;
            engine::derive_flags(&mut record, &self.rules);
            if self.repo.insert_player(&record).await? {
                info!(
                    player = %id,
                    referrer = ?record.profile.referral.as_ref().map(|r| r.referrer_id),
                    "Registered player"
                );
            }
        }

        let (loaded, recomputed) = self.begin(id, now).await?;
        let mut record = recomputed.record;
        let token = self.issue_token(&mut record, now)?;
        let record = self.commit(&loaded, record, now).await?;
        Ok((record, token))
    }

    async fn resolve_referral(
        &self,
        id: PlayerId,
        referral_code: Option<&str>,
    ) -> Result<Option<ReferralEdge>, GameError> {
        let Some(referrer_id) = referral_code.and_then(|code| code.trim().parse::<PlayerId>().ok())
        else {
            return Ok(None);
        };
        if referrer_id == id {
            return Ok(None);
        }

        let Some(referrer) = self.repo.get_player(referrer_id).await? else {
            debug!(player = %id, referrer = %referrer_id, "Unknown referrer ignored");
            return Ok(None);
        };
        if referrer.status() != AccountStatus::Active {
            return Ok(None);
        }

        Ok(referrer.profile.nickname.map(|nickname| ReferralEdge {
            referrer_id,
            referrer_nickname: nickname,
        }))
    }

    /// Re-issue a token. Only the most recently issued token is accepted.
    pub async fn refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(PlayerRecord, String), GameError> {
        let claims = self.tokens.decode(token, now)?;
        let (loaded, recomputed) = self.begin(claims.sub, now).await?;
        if loaded.profile.jti != Some(claims.jti) {
            return Err(TokenError::Revoked.into());
        }

        let mut record = recomputed.record;
        let token = self.issue_token(&mut record, now)?;
        let record = self.commit(&loaded, record, now).await?;
        Ok((record, token))
    }

    /// Log out: forget the current token so neither it nor any earlier one
    /// is accepted again.
    pub async fn revoke_token(&self, id: PlayerId, now: DateTime<Utc>) -> Result<(), GameError> {
        let (loaded, recomputed) = self.begin(id, now).await?;
        let mut record = recomputed.record;
        record.profile.jti = None;
        self.commit(&loaded, record, now).await?;
        info!(player = %id, "Session token revoked");
        Ok(())
    }

    /// Format check plus case-insensitive availability.
    pub async fn check_nickname(&self, nickname: &str) -> Result<bool, GameError> {
        validate_nickname(nickname)?;
        Ok(self.repo.nickname_available(nickname).await?)
    }

    /// Set the player's nickname once. The first successful call settles the
    /// level-0 referral bonus for both sides.
    pub async fn set_nickname(
        &self,
        id: PlayerId,
        nickname: &str,
        now: DateTime<Utc>,
    ) -> Result<(PlayerRecord, String, Option<ReferralSettlement>), GameError> {
        validate_nickname(nickname)?;
        let (loaded, recomputed) = self.begin(id, now).await?;
        if loaded.profile.nickname.is_some() {
            return Err(GameError::NicknameAlreadySet);
        }
        if !self.repo.nickname_available(nickname).await? {
            return Err(GameError::NicknameConflict);
        }

        let mut record = recomputed.record;
        record.profile.nickname = Some(nickname.to_string());
        let settlement = self.referral_settlement(&record);
        if let Some(settlement) = &settlement {
            record.points += settlement.recipient_bonus;
        }
        let token = self.issue_token(&mut record, now)?;
        stamp(&mut record, &self.rules, now);

        match self.repo.save_player_setting_nickname(&record).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(match self.load_active(id).await {
                    Ok(current) if current.profile.nickname.is_some() => {
                        GameError::NicknameAlreadySet
                    }
                    Ok(_) => GameError::NoSuchPlayer,
                    Err(err) => err,
                })
            }
            Err(err) if is_unique_violation(&err) => return Err(GameError::NicknameConflict),
            Err(err) => return Err(err.into()),
        }
        self.propagate(&record).await;

        let settlement = match settlement {
            Some(settlement) => Some(self.settle_with_referrer(settlement).await),
            None => None,
        };

        info!(
            player = %id,
            nickname,
            settled = settlement.is_some(),
            "Nickname set"
        );
        Ok((record, token, settlement))
    }
}
