use crate::domain::bar::RawBar;
use crate::ingest::{Lookback, SeriesProvider};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
struct CachedBars {
    bars: Vec<RawBar>,
    fetched_at: DateTime<Utc>,
}

/// Wraps a provider with a per-(symbol, lookback) cache that expires after `ttl`.
///
/// Failed fetches are not cached. The lock is not held across the upstream call, so two
/// concurrent misses for the same key may both fetch; the later write wins.
pub struct CachedSeriesProvider<P> {
    inner: P,
    ttl: chrono::Duration,
    clock: Clock,
    entries: tokio::sync::Mutex<HashMap<(String, Lookback), CachedBars>>,
}

impl<P: SeriesProvider> CachedSeriesProvider<P> {
    pub fn new(inner: P, ttl: std::time::Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        Self {
            inner,
            ttl,
            clock: Arc::new(Utc::now),
            entries: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        let clock: Clock = Arc::new(clock);
        self.clock = clock;
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of entries currently held. Expired entries are dropped on the next insert.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_fresh(&self, entry: &CachedBars, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.fetched_at) < self.ttl
    }
}

#[async_trait::async_trait]
impl<P: SeriesProvider> SeriesProvider for CachedSeriesProvider<P> {
    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    async fn fetch_daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<Vec<RawBar>> {
        let key = (symbol.trim().to_string(), lookback);

        {
            let guard = self.entries.lock().await;
            if let Some(entry) = guard.get(&key) {
                if self.is_fresh(entry, (self.clock)()) {
                    tracing::debug!(ticker = %symbol, %lookback, "series cache hit");
                    return Ok(entry.bars.clone());
                }
            }
        }

        let bars = self.inner.fetch_daily_bars(symbol, lookback).await?;
        let fetched_at = (self.clock)();

        let mut guard = self.entries.lock().await;
        guard.retain(|_, entry| self.is_fresh(entry, fetched_at));
        guard.insert(
            key,
            CachedBars {
                bars: bars.clone(),
                fetched_at,
            },
        );
        Ok(bars)
    }
}
