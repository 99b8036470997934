use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Main board (`.TW`).
    Listed,
    /// Over-the-counter board (`.TWO`).
    Otc,
    Other,
}

impl Segment {
    pub fn from_symbol(symbol: &str) -> Self {
        let upper = symbol.trim().to_ascii_uppercase();
        if upper.ends_with(".TWO") {
            Segment::Otc
        } else if upper.ends_with(".TW") {
            Segment::Listed
        } else {
            Segment::Other
        }
    }
}

/// A ticker entering the ranking pass.
///
/// `volume` is whatever unit the caller picked for this pass (shares or lots); ranking only
/// compares candidates with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerCandidate {
    pub symbol: String,
    pub name: Option<String>,
    pub segment: Option<Segment>,
    pub volume: u64,
}

impl TickerCandidate {
    pub fn new(symbol: impl Into<String>, volume: u64) -> Self {
        let symbol = symbol.into();
        let segment = Some(Segment::from_symbol(&symbol));
        Self {
            symbol,
            name: None,
            segment,
            volume,
        }
    }

    /// Symbol without the exchange suffix, e.g. `2330` for `2330.TW`.
    pub fn code(&self) -> &str {
        symbol_code(&self.symbol)
    }
}

pub fn symbol_code(symbol: &str) -> &str {
    symbol.split('.').next().unwrap_or(symbol)
}
