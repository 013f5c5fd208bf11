//! In-process ranking store for tests and single-node development.

use super::{RankingError, RankingStore, Scope};
use crate::domain::PlayerId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
struct Entry {
    player: PlayerId,
    score: i64,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    scopes: HashMap<Scope, Vec<Entry>>,
    next_seq: u64,
}

/// Ranking store kept in memory; ties resolve by first insertion.
#[derive(Debug, Default)]
pub struct MemoryRankingStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemoryRankingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to simulate an unreachable index.
    pub fn with_failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current score of `player` in `scope`, if indexed.
    pub async fn score(&self, scope: Scope, player: PlayerId) -> Option<i64> {
        let inner = self.inner.lock().await;
        inner
            .scopes
            .get(&scope)?
            .iter()
            .find(|e| e.player == player)
            .map(|e| e.score)
    }

    pub async fn len(&self, scope: Scope) -> usize {
        let inner = self.inner.lock().await;
        inner.scopes.get(&scope).map(Vec::len).unwrap_or(0)
    }

    fn check_writable(&self) -> Result<(), RankingError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RankingError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

fn sorted(entries: &[Entry]) -> Vec<Entry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.seq.cmp(&b.seq)));
    sorted
}

#[async_trait]
impl RankingStore for MemoryRankingStore {
    async fn upsert_score(
        &self,
        scope: Scope,
        player: PlayerId,
        score: i64,
    ) -> Result<(), RankingError> {
        self.check_writable()?;
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let seq = inner.next_seq;
        let entries = inner.scopes.entry(scope).or_default();
        match entries.iter_mut().find(|e| e.player == player) {
            Some(entry) => entry.score = score,
            None => {
                entries.push(Entry { player, score, seq });
                inner.next_seq += 1;
            }
        }
        Ok(())
    }

    async fn descending_rank(
        &self,
        scope: Scope,
        player: PlayerId,
    ) -> Result<Option<u64>, RankingError> {
        let inner = self.inner.lock().await;
        let Some(entries) = inner.scopes.get(&scope) else {
            return Ok(None);
        };
        Ok(sorted(entries)
            .iter()
            .position(|e| e.player == player)
            .map(|idx| idx as u64 + 1))
    }

    async fn descending_range(
        &self,
        scope: Scope,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PlayerId>, RankingError> {
        let inner = self.inner.lock().await;
        let Some(entries) = inner.scopes.get(&scope) else {
            return Ok(Vec::new());
        };
        Ok(sorted(entries)
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|e| e.player)
            .collect())
    }

    async fn flush(&self, scope: Scope) -> Result<(), RankingError> {
        self.check_writable()?;
        self.inner.lock().await.scopes.remove(&scope);
        Ok(())
    }
}
