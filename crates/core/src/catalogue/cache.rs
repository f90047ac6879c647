//! Time-bounded cache in front of a terminology catalogue.
//!
//! The catalogue is read-mostly, so answers (including misses) are kept for a short TTL and
//! shared by every pass using the same client. Unavailability is never cached: the next
//! lookup tries the source again.

use super::{CatalogueEntry, CatalogueKey, TerminologyCatalogue};
use crate::TerminologyResult;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone, Debug)]
struct CachedAnswer {
    answer: Option<CatalogueEntry>,
    stored_at: Instant,
}

/// Caching decorator for any [`TerminologyCatalogue`].
pub struct CachedCatalogue<C> {
    inner: C,
    entries: DashMap<CatalogueKey, CachedAnswer>,
    ttl: Duration,
    max_entries: usize,
}

impl<C> CachedCatalogue<C> {
    pub fn new(inner: C, ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn fresh(&self, key: &CatalogueKey, now: Instant) -> Option<Option<CatalogueEntry>> {
        let cached = self.entries.get(key)?;
        if now.duration_since(cached.stored_at) < self.ttl {
            Some(cached.answer.clone())
        } else {
            None
        }
    }

    fn store(&self, key: CatalogueKey, answer: Option<CatalogueEntry>, now: Instant) {
        self.entries.insert(
            key,
            CachedAnswer {
                answer,
                stored_at: now,
            },
        );

        if self.entries.len() > self.max_entries {
            self.evict(now);
        }
    }

    /// Size the cache shrinks to once it overflows, leaving headroom so eviction runs in
    /// batches rather than on every insert.
    fn low_water_mark(&self) -> usize {
        self.max_entries - self.max_entries / 10
    }

    /// Drop expired answers, then the oldest ones down to the low-water mark.
    fn evict(&self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, cached| now.duration_since(cached.stored_at) < ttl);

        if self.entries.len() <= self.max_entries {
            return;
        }
        let excess = self.entries.len() - self.low_water_mark();

        let mut by_age: Vec<(CatalogueKey, Instant)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().stored_at))
            .collect();
        by_age.sort_by_key(|(_, stored_at)| *stored_at);

        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
    }
}

#[async_trait]
impl<C: TerminologyCatalogue> TerminologyCatalogue for CachedCatalogue<C> {
    async fn lookup(&self, key: &CatalogueKey) -> TerminologyResult<Option<CatalogueEntry>> {
        if let Some(answer) = self.fresh(key, Instant::now()) {
            return Ok(answer);
        }

        let answer = self.inner.lookup(key).await?;
        self.store(key.clone(), answer.clone(), Instant::now());
        Ok(answer)
    }
}
