//! The "dream takeoff" screen: price stacked above its short and mid moving averages, a
//! moderate distance from the 200-day average, and both the 200-day price average and the
//! 20-day volume average trending up.

use crate::domain::bar::BarSeries;
use crate::domain::evaluation::{EvaluationResult, NoMatch, TrendMode};
use crate::strategy::indicators::{
    bias_pct, endpoint_rising, sma_last, sma_series, strictly_rising, trailing,
};
use anyhow::ensure;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Minimum number of usable bars before anything is computed.
    pub min_bars: usize,
    /// Close must be above the moving average of each of these windows.
    pub alignment_windows: Vec<usize>,
    /// Short moving average used in the bias ratio.
    pub bias_window: usize,
    /// Long moving average (bias denominator and price trend).
    pub long_window: usize,
    /// Volume moving average window.
    pub volume_window: usize,
    /// Trend window length is `trend_lookback + 1` values.
    pub trend_lookback: usize,
    /// Bias must be strictly below this many percentage points.
    pub max_bias_pct: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            min_bars: 205,
            alignment_windows: vec![5, 20, 60, 120],
            bias_window: 5,
            long_window: 200,
            volume_window: 20,
            trend_lookback: 10,
            max_bias_pct: 30.0,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.alignment_windows.is_empty(), "alignment_windows must be non-empty");
        ensure!(
            self.alignment_windows.iter().all(|w| *w >= 1),
            "alignment windows must be >= 1"
        );
        ensure!(self.bias_window >= 1, "bias_window must be >= 1");
        ensure!(self.long_window >= 1, "long_window must be >= 1");
        ensure!(self.volume_window >= 1, "volume_window must be >= 1");
        ensure!(self.trend_lookback >= 1, "trend_lookback must be >= 1");
        ensure!(
            self.max_bias_pct.is_finite(),
            "max_bias_pct must be finite (got {})",
            self.max_bias_pct
        );

        let widest = self
            .alignment_windows
            .iter()
            .copied()
            .chain([self.bias_window, self.long_window, self.volume_window])
            .max()
            .unwrap_or(0);
        ensure!(
            self.min_bars >= widest,
            "min_bars must cover the widest window: {} < {widest}",
            self.min_bars
        );
        Ok(())
    }

    /// Bars needed before both trend windows are fully defined.
    fn trend_bars_required(&self) -> usize {
        self.long_window.max(self.volume_window) + self.trend_lookback
    }
}

/// Evaluates with the default parameters.
pub fn evaluate(series: &BarSeries, mode: TrendMode) -> Option<EvaluationResult> {
    evaluate_with(series, mode, &StrategyParams::default())
}

pub fn evaluate_with(
    series: &BarSeries,
    mode: TrendMode,
    params: &StrategyParams,
) -> Option<EvaluationResult> {
    evaluate_detailed(series, mode, params).ok()
}

/// Same as [`evaluate_with`] but reports why a series did not match.
pub fn evaluate_detailed(
    series: &BarSeries,
    mode: TrendMode,
    params: &StrategyParams,
) -> Result<EvaluationResult, NoMatch> {
    let usable = series.len();
    if usable < params.min_bars {
        return Err(NoMatch::InsufficientData {
            usable,
            required: params.min_bars,
        });
    }
    let Some(last) = series.last().copied() else {
        return Err(NoMatch::InsufficientData {
            usable,
            required: params.min_bars.max(1),
        });
    };

    let closes = series.closes();
    let volumes = series.volumes();
    let insufficient = || NoMatch::InsufficientData {
        usable,
        required: params.trend_bars_required(),
    };

    // Early exit: nothing else is computed when the close is not stacked above every average.
    for &window in &params.alignment_windows {
        let ma = sma_last(&closes, window).ok_or_else(insufficient)?;
        if !(last.close > ma) {
            return Err(NoMatch::NotAligned);
        }
    }

    let long_ma = sma_series(&closes, params.long_window);
    let volume_ma = sma_series(&volumes, params.volume_window);
    let long_window = trailing(&long_ma, params.trend_lookback).ok_or_else(insufficient)?;
    let volume_window = trailing(&volume_ma, params.trend_lookback).ok_or_else(insufficient)?;

    let short_ma = sma_last(&closes, params.bias_window).ok_or_else(insufficient)?;
    let long_last = long_window
        .last()
        .copied()
        .ok_or(NoMatch::DegenerateIndicator("empty long moving average"))?;
    let bias = bias_pct(short_ma, long_last)
        .ok_or(NoMatch::DegenerateIndicator("bias undefined for long moving average"))?;
    if !(bias < params.max_bias_pct) {
        return Err(NoMatch::BiasTooHigh { bias_pct: bias });
    }

    let rising: fn(&[f64]) -> bool = match mode {
        TrendMode::Strict => strictly_rising,
        TrendMode::Lenient => endpoint_rising,
    };
    let ma_ok = rising(long_window);
    let volume_ok = rising(volume_window);
    if !(ma_ok && volume_ok) {
        return Err(NoMatch::TrendNotRising {
            ma200: ma_ok,
            volume: volume_ok,
        });
    }

    Ok(EvaluationResult {
        symbol: series.symbol.clone(),
        as_of_date: last.date,
        close: last.close,
        volume: last.volume,
        bias_pct: bias,
        trend: mode.label(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::RawBar;
    use crate::domain::evaluation::TrendLabel;
    use chrono::{Duration, NaiveDate};

    fn series_from(closes: &[f64], volumes: &[f64]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let raws: Vec<RawBar> = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (c, v))| RawBar {
                date: start + Duration::days(i as i64),
                close: Some(*c),
                volume: Some(*v),
            })
            .collect();
        BarSeries::from_raw("2330.TW", &raws)
    }

    fn rising_closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + 0.1 * i as f64).collect()
    }

    fn rising_volumes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 1_000_000.0 + 10_000.0 * i as f64).collect()
    }

    #[test]
    fn steady_uptrend_matches_in_both_modes() {
        let s = series_from(&rising_closes(400), &rising_volumes(400));

        let lenient = evaluate(&s, TrendMode::Lenient).expect("lenient match");
        assert_eq!(lenient.trend, TrendLabel::Up);
        assert!((lenient.close - 139.9).abs() < 1e-9);
        // MA5 = 139.7, MA200 = 129.95
        assert!((lenient.bias_pct - (139.7 - 129.95) / 129.95 * 100.0).abs() < 1e-6);
        assert!(lenient.bias_pct > 0.0 && lenient.bias_pct < 30.0);

        let strict = evaluate(&s, TrendMode::Strict).expect("strict match");
        assert_eq!(strict.trend, TrendLabel::Strong);
    }

    #[test]
    fn constant_volume_fails_volume_trend() {
        let s = series_from(&rising_closes(400), &vec![1_000_000.0; 400]);
        let err = evaluate_detailed(&s, TrendMode::Lenient, &StrategyParams::default()).unwrap_err();
        assert_eq!(
            err,
            NoMatch::TrendNotRising {
                ma200: true,
                volume: false
            }
        );
    }

    #[test]
    fn flat_series_never_matches() {
        let s = series_from(&vec![50.0; 400], &vec![1_000.0; 400]);
        assert!(evaluate(&s, TrendMode::Strict).is_none());
        assert!(evaluate(&s, TrendMode::Lenient).is_none());
    }

    #[test]
    fn one_bar_short_is_insufficient() {
        let s = series_from(&rising_closes(204), &rising_volumes(204));
        let err = evaluate_detailed(&s, TrendMode::Lenient, &StrategyParams::default()).unwrap_err();
        assert_eq!(
            err,
            NoMatch::InsufficientData {
                usable: 204,
                required: 205
            }
        );
    }

    #[test]
    fn trend_window_needs_fully_defined_long_average() {
        // 205..=209 bars clear the sufficiency gate but leave fewer than 11 MA200 values.
        let s = series_from(&rising_closes(209), &rising_volumes(209));
        let err = evaluate_detailed(&s, TrendMode::Lenient, &StrategyParams::default()).unwrap_err();
        assert_eq!(
            err,
            NoMatch::InsufficientData {
                usable: 209,
                required: 210
            }
        );

        let s = series_from(&rising_closes(210), &rising_volumes(210));
        assert!(evaluate(&s, TrendMode::Lenient).is_some());
    }

    #[test]
    fn invalid_bars_count_against_sufficiency() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let raws: Vec<RawBar> = (0..220)
            .map(|i| RawBar {
                date: start + Duration::days(i as i64),
                close: if i % 10 == 0 { None } else { Some(100.0 + i as f64) },
                volume: Some(1_000.0 + i as f64),
            })
            .collect();
        let s = BarSeries::from_raw("2330.TW", &raws);
        assert_eq!(s.len(), 198);
        assert!(evaluate(&s, TrendMode::Lenient).is_none());
    }

    #[test]
    fn close_below_short_average_is_not_aligned() {
        let mut closes = rising_closes(400);
        let last = closes.len() - 1;
        closes[last] = closes[last - 1] - 1.0;
        let s = series_from(&closes, &rising_volumes(400));
        let err = evaluate_detailed(&s, TrendMode::Lenient, &StrategyParams::default()).unwrap_err();
        assert_eq!(err, NoMatch::NotAligned);
    }

    #[test]
    fn parabolic_run_is_rejected_on_bias() {
        let closes: Vec<f64> = (0..400).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let s = series_from(&closes, &rising_volumes(400));
        let err = evaluate_detailed(&s, TrendMode::Lenient, &StrategyParams::default()).unwrap_err();
        assert!(matches!(err, NoMatch::BiasTooHigh { bias_pct } if bias_pct >= 30.0));
    }

    #[test]
    fn volume_dip_inside_window_only_fails_strict() {
        let closes = rising_closes(400);
        let mut volumes = rising_volumes(400);
        volumes[395] -= 150_000.0 * 10.0;
        let s = series_from(&closes, &volumes);

        let err = evaluate_detailed(&s, TrendMode::Strict, &StrategyParams::default()).unwrap_err();
        assert_eq!(
            err,
            NoMatch::TrendNotRising {
                ma200: true,
                volume: false
            }
        );
        assert!(evaluate(&s, TrendMode::Lenient).is_some());
    }

    #[test]
    fn zero_close_series_yields_no_match() {
        let s = series_from(&vec![0.0; 400], &rising_volumes(400));
        assert!(s.is_empty());
        assert!(evaluate(&s, TrendMode::Strict).is_none());
        assert!(evaluate(&s, TrendMode::Lenient).is_none());
    }

    #[test]
    fn configurable_sufficiency_and_lookback() {
        let params = StrategyParams {
            min_bars: 210,
            trend_lookback: 9,
            ..StrategyParams::default()
        };
        params.validate().unwrap();

        let s = series_from(&rising_closes(209), &rising_volumes(209));
        assert!(evaluate_with(&s, TrendMode::Strict, &params).is_none());
        let s = series_from(&rising_closes(210), &rising_volumes(210));
        assert!(evaluate_with(&s, TrendMode::Strict, &params).is_some());
    }

    #[test]
    fn validate_rejects_min_bars_below_long_window() {
        let params = StrategyParams {
            min_bars: 150,
            ..StrategyParams::default()
        };
        assert!(params.validate().is_err());
        assert!(StrategyParams::default().validate().is_ok());
    }
}
