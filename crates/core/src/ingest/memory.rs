use crate::domain::bar::RawBar;
use crate::ingest::{Lookback, SeriesProvider};
use anyhow::{Context, Result};
use chrono::Duration;
use std::collections::HashMap;
use std::path::Path;

/// Fixed bars per symbol, e.g. loaded from a JSON fixture for offline runs.
#[derive(Debug, Clone, Default)]
pub struct InMemorySeriesProvider {
    series: HashMap<String, Vec<RawBar>>,
}

impl InMemorySeriesProvider {
    pub fn new(series: HashMap<String, Vec<RawBar>>) -> Self {
        Self { series }
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<RawBar>) {
        self.series.insert(symbol.into(), bars);
    }

    /// Parses `{"2330.TW": [{"date": "2026-10-16", "close": 1450.0, "volume": 2.5e7}, ...]}`.
    pub fn from_json(text: &str) -> Result<Self> {
        let series = serde_json::from_str::<HashMap<String, Vec<RawBar>>>(text)
            .context("fixture is not a symbol -> bars map")?;
        Ok(Self { series })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid fixture {}", path.display()))
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = self.series.keys().cloned().collect();
        out.sort();
        out
    }
}

#[async_trait::async_trait]
impl SeriesProvider for InMemorySeriesProvider {
    fn provider_name(&self) -> &'static str {
        "in_memory"
    }

    async fn fetch_daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<Vec<RawBar>> {
        let Some(bars) = self.series.get(symbol.trim()) else {
            return Ok(Vec::new());
        };

        let out = match lookback {
            Lookback::Days(n) => {
                let n = n as usize;
                bars[bars.len().saturating_sub(n)..].to_vec()
            }
            Lookback::Years(n) => match bars.last() {
                Some(last) => {
                    let cutoff = last.date - Duration::days(365 * i64::from(n));
                    bars.iter().filter(|b| b.date > cutoff).cloned().collect()
                }
                None => Vec::new(),
            },
        };
        Ok(out)
    }
}
