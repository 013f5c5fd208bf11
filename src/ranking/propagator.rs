//! Best-effort propagation of authoritative points into the ranking index.

use super::{RankingStore, Scope};
use crate::domain::{Level, PlayerId};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationMode {
    /// Spawn the write and return immediately.
    Detached,
    /// Await the write before returning. Failures are still only logged.
    Inline,
}

impl FromStr for PropagationMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detached" => Ok(PropagationMode::Detached),
            "inline" => Ok(PropagationMode::Inline),
            _ => Err(()),
        }
    }
}

/// Writes a player's score to the global scope and to their current level's
/// scope. Never fails the caller.
#[derive(Debug, Clone)]
pub struct RankPropagator {
    store: Arc<dyn RankingStore>,
    mode: PropagationMode,
}

impl RankPropagator {
    pub fn new(store: Arc<dyn RankingStore>, mode: PropagationMode) -> Self {
        Self { store, mode }
    }

    pub async fn propagate(&self, player: PlayerId, level: Level, points: i64) {
        match self.mode {
            PropagationMode::Inline => write_scores(self.store.clone(), player, level, points).await,
            PropagationMode::Detached => {
                tokio::spawn(write_scores(self.store.clone(), player, level, points));
            }
        }
    }
}

async fn write_scores(store: Arc<dyn RankingStore>, player: PlayerId, level: Level, points: i64) {
    let level_scope = Scope::Level(level);
    let (global, by_level) = futures::future::join(
        store.upsert_score(Scope::Global, player, points),
        store.upsert_score(level_scope, player, points),
    )
    .await;

    for (scope, result) in [(Scope::Global, global), (level_scope, by_level)] {
        match result {
            Ok(()) => debug!(player = %player, scope = %scope, points, "Rank index updated"),
            Err(e) => warn!(
                player = %player,
                scope = %scope,
                points,
                error = %e,
                "Dropped ranking index write"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::MemoryRankingStore;

    #[test]
    fn test_mode_parse() {
        assert_eq!("Inline".parse::<PropagationMode>(), Ok(PropagationMode::Inline));
        assert_eq!(
            "detached".parse::<PropagationMode>(),
            Ok(PropagationMode::Detached)
        );
        assert!("sync".parse::<PropagationMode>().is_err());
    }

    #[tokio::test]
    async fn test_inline_writes_global_and_level() {
        let store = Arc::new(MemoryRankingStore::new());
        let propagator = RankPropagator::new(store.clone(), PropagationMode::Inline);

        propagator
            .propagate(PlayerId::new(1), Level::new(2), 500)
            .await;

        assert_eq!(store.score(Scope::Global, PlayerId::new(1)).await, Some(500));
        assert_eq!(
            store.score(Scope::Level(Level::new(2)), PlayerId::new(1)).await,
            Some(500)
        );
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let store = Arc::new(MemoryRankingStore::new().with_failing_writes());
        let propagator = RankPropagator::new(store.clone(), PropagationMode::Inline);

        propagator.propagate(PlayerId::new(1), Level::ZERO, 5).await;
        assert_eq!(store.len(Scope::Global).await, 0);
    }
}
