use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the MA200 and VolMA20 trend windows are judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMode {
    /// Every day-over-day delta in the window must be positive.
    Strict,
    /// Only the window's last value must exceed its first.
    #[default]
    Lenient,
}

impl TrendMode {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            TrendMode::Strict
        } else {
            TrendMode::Lenient
        }
    }

    pub fn label(self) -> TrendLabel {
        match self {
            TrendMode::Strict => TrendLabel::Strong,
            TrendMode::Lenient => TrendLabel::Up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Strong,
    Up,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendLabel::Strong => f.pad("strong"),
            TrendLabel::Up => f.pad("up"),
        }
    }
}

/// A ticker that passed every condition. Built once per evaluation and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub symbol: String,
    pub as_of_date: NaiveDate,
    pub close: f64,
    pub volume: u64,
    pub bias_pct: f64,
    pub trend: TrendLabel,
}

impl EvaluationResult {
    /// Volume in lots of 1,000 shares.
    pub fn volume_lots(&self) -> u64 {
        self.volume / 1_000
    }

    pub fn bias_display(&self) -> String {
        format!("{:.1}%", self.bias_pct)
    }
}

/// Why a series did not match. Never surfaced as a failure of the scan.
#[derive(Debug, Clone, PartialEq)]
pub enum NoMatch {
    InsufficientData { usable: usize, required: usize },
    DegenerateIndicator(&'static str),
    NotAligned,
    BiasTooHigh { bias_pct: f64 },
    TrendNotRising { ma200: bool, volume: bool },
}

impl fmt::Display for NoMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoMatch::InsufficientData { usable, required } => {
                write!(f, "insufficient data: {usable} usable bars, {required} required")
            }
            NoMatch::DegenerateIndicator(what) => write!(f, "degenerate indicator: {what}"),
            NoMatch::NotAligned => f.write_str("close is not above every short/mid moving average"),
            NoMatch::BiasTooHigh { bias_pct } => write!(f, "bias too high: {bias_pct:.1}%"),
            NoMatch::TrendNotRising { ma200, volume } => write!(
                f,
                "trend not rising (ma200_ok={ma200}, volume_ok={volume})"
            ),
        }
    }
}

impl std::error::Error for NoMatch {}
