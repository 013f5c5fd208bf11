//! Economy transaction layer.
//!
//! Every transaction runs the same sequence: load the record, reject
//! soft-disabled players, recompute, validate against the recomputed state,
//! apply one delta, persist, then propagate the score to the ranking index.
//! There is no per-player locking; concurrent writes are last-write-wins.

mod boosts;
mod progression;
mod referral;
mod session;

pub use boosts::BoostKind;
pub use referral::ReferralSettlement;
pub use session::validate_nickname;

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::db::Repository;
use crate::domain::{AccountStatus, PlayerId, PlayerRecord, RuleConfig};
use crate::engine::{self, Recomputed};
use crate::error::GameError;
use crate::ranking::RankPropagator;
use crate::token::{Claims, TokenError, TokenIssuer};

pub struct EconomyService {
    repo: Arc<Repository>,
    ranking: RankPropagator,
    rules: Arc<RuleConfig>,
    tokens: Arc<dyn TokenIssuer>,
    token_ttl: Duration,
}

impl EconomyService {
    pub fn new(
        repo: Arc<Repository>,
        ranking: RankPropagator,
        rules: Arc<RuleConfig>,
        tokens: Arc<dyn TokenIssuer>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            repo,
            ranking,
            rules,
            tokens,
            token_ttl,
        }
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// Whether the document store answers.
    pub async fn ping(&self) -> Result<(), GameError> {
        Ok(self.repo.ping().await?)
    }

    /// Resolve a bearer token to the player it was issued for. Only the
    /// player's most recently issued token is accepted.
    pub async fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PlayerId, GameError> {
        Ok(self.session_holder(token, now).await?.id)
    }

    /// As [`Self::authenticate`], for gameplay that needs a nickname first.
    pub async fn authenticate_named(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PlayerId, GameError> {
        let record = self.session_holder(token, now).await?;
        if record.profile.nickname.is_none() {
            return Err(GameError::NicknameRequired);
        }
        Ok(record.id)
    }

    async fn session_holder(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        let claims = self.tokens.decode(token, now)?;
        let record = self.load_active(claims.sub).await?;
        if record.profile.jti != Some(claims.jti) {
            return Err(TokenError::Revoked.into());
        }
        Ok(record)
    }

    /// Recompute and, when a grant is pending, persist it. Used by reads.
    pub async fn read_player(
        &self,
        id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        let (loaded, recomputed) = self.begin(id, now).await?;
        if !recomputed.has_grants() {
            return Ok(recomputed.record);
        }
        self.commit(&loaded, recomputed.record, now).await
    }

    async fn load_active(&self, id: PlayerId) -> Result<PlayerRecord, GameError> {
        let record = self
            .repo
            .get_player(id)
            .await?
            .ok_or(GameError::NoSuchPlayer)?;
        match record.status() {
            AccountStatus::Active => Ok(record),
            AccountStatus::Banned => Err(GameError::Banned),
            AccountStatus::Ghost => Err(GameError::Ghost),
        }
    }

    /// Load and recompute. Returns the stored record alongside the
    /// should-be state.
    async fn begin(
        &self,
        id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<(PlayerRecord, Recomputed), GameError> {
        let loaded = self.load_active(id).await?;
        let recomputed = engine::recompute(&loaded, &self.rules, now);
        Ok((loaded, recomputed))
    }

    /// Persist `record` and propagate its score if it moved.
    async fn commit(
        &self,
        loaded: &PlayerRecord,
        mut record: PlayerRecord,
        now: DateTime<Utc>,
    ) -> Result<PlayerRecord, GameError> {
        stamp(&mut record, &self.rules, now);
        if !self.repo.save_player(&record).await? {
            return Err(self.rejection(record.id).await);
        }
        if loaded.points != record.points || loaded.level != record.level {
            self.propagate(&record).await;
        }
        Ok(record)
    }

    /// Why a guarded write matched no row.
    async fn rejection(&self, id: PlayerId) -> GameError {
        match self.load_active(id).await {
            Ok(_) => GameError::NoSuchPlayer,
            Err(err) => err,
        }
    }

    /// Index a player's score. Unnamed players are not ranked.
    async fn propagate(&self, record: &PlayerRecord) {
        if record.profile.nickname.is_some() {
            self.ranking
                .propagate(record.id, record.level, record.points)
                .await;
        }
    }

    fn issue_token(
        &self,
        record: &mut PlayerRecord,
        now: DateTime<Utc>,
    ) -> Result<String, GameError> {
        let claims = Claims::new(
            record.id,
            record.profile.nickname.clone(),
            self.tokens.issuer(),
            now,
            self.token_ttl,
        );
        let token = self.tokens.encode(&claims)?;
        record.profile.jti = Some(claims.jti);
        Ok(token)
    }
}

/// Mark a record as written at `now`.
fn stamp(record: &mut PlayerRecord, rules: &RuleConfig, now: DateTime<Utc>) {
    record.played_at = now;
    record.profile.updated_at = now;
    engine::derive_flags(record, rules);
}
