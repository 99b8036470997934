pub mod cache;
pub mod memory;
pub mod yahoo;

use crate::domain::bar::RawBar;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far back a provider should reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lookback {
    Days(u32),
    Years(u32),
}

impl Lookback {
    /// Range token understood by chart endpoints (`5d`, `1y`).
    pub fn as_range(&self) -> String {
        match self {
            Lookback::Days(n) => format!("{n}d"),
            Lookback::Years(n) => format!("{n}y"),
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_range())
    }
}

/// Source of daily bars for one symbol.
///
/// An unknown symbol or a symbol without data is `Ok(vec![])`, not an error.
#[async_trait::async_trait]
pub trait SeriesProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<Vec<RawBar>>;
}
