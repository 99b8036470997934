use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily row as delivered by a series provider. Any field may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// A cleaned end-of-day observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    fn from_raw(raw: &RawBar) -> Option<Self> {
        let close = raw.close.filter(|c| c.is_finite() && *c > 0.0)?;
        let volume = raw.volume.filter(|v| v.is_finite() && *v >= 0.0)?;
        Some(Self {
            date: raw.date,
            close,
            volume: volume.trunc() as u64,
        })
    }
}

/// Chronological bars for one ticker. Dates are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Drops rows with a missing/non-finite/non-positive close or a missing/negative volume,
    /// plus any row whose date does not advance past the previously kept row.
    pub fn from_raw(symbol: impl Into<String>, raws: &[RawBar]) -> Self {
        let mut bars: Vec<Bar> = Vec::with_capacity(raws.len());
        for raw in raws {
            let Some(bar) = Bar::from_raw(raw) else {
                continue;
            };
            if let Some(prev) = bars.last() {
                if bar.date <= prev.date {
                    continue;
                }
            }
            bars.push(bar);
        }

        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }
}
