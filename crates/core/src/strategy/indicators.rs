//! Trailing window helpers over plain `f64` slices (oldest first).

/// Simple moving average for every full window, inclusive of the current value.
///
/// The output has `values.len() - window + 1` entries; entry `i` corresponds to input index
/// `i + window - 1`. Empty when the window is zero or longer than the input.
pub fn sma_series(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || window > values.len() {
        return Vec::new();
    }

    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Simple moving average ending at the last value.
pub fn sma_last(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || window > values.len() {
        return None;
    }
    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// The last `lookback + 1` values: the current one plus `lookback` before it.
pub fn trailing(values: &[f64], lookback: usize) -> Option<&[f64]> {
    let need = lookback.checked_add(1)?;
    if values.len() < need {
        return None;
    }
    Some(&values[values.len() - need..])
}

/// Every consecutive delta is strictly positive. A NaN anywhere fails.
pub fn strictly_rising(window: &[f64]) -> bool {
    window.len() >= 2 && window.windows(2).all(|p| p[1] - p[0] > 0.0)
}

/// The last value strictly exceeds the first.
pub fn endpoint_rising(window: &[f64]) -> bool {
    match (window.first(), window.last()) {
        (Some(first), Some(last)) if window.len() >= 2 => last > first,
        _ => false,
    }
}

/// `(short - long) / long * 100`, or `None` when the ratio is undefined.
pub fn bias_pct(short: f64, long: f64) -> Option<f64> {
    if long == 0.0 || !long.is_finite() || !short.is_finite() {
        return None;
    }
    let v = (short - long) / long * 100.0;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_series_aligns_with_input_tail() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma_series(&values, 3), vec![2.0, 3.0, 4.0]);
        assert_eq!(sma_series(&values, 5), vec![3.0]);
        assert!(sma_series(&values, 6).is_empty());
        assert!(sma_series(&values, 0).is_empty());
    }

    #[test]
    fn sma_last_matches_series_tail() {
        let values: Vec<f64> = (0..50).map(|i| (i as f64) * 0.7 + 3.0).collect();
        let series = sma_series(&values, 20);
        let last = sma_last(&values, 20).unwrap();
        assert!((series.last().copied().unwrap() - last).abs() < 1e-9);
        assert!(sma_last(&values, 51).is_none());
    }

    #[test]
    fn trailing_takes_current_plus_lookback() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(trailing(&values, 2), Some(&[2.0, 3.0, 4.0][..]));
        assert_eq!(trailing(&values, 3), Some(&values[..]));
        assert!(trailing(&values, 4).is_none());
    }

    #[test]
    fn rising_checks() {
        assert!(strictly_rising(&[1.0, 2.0, 3.0]));
        assert!(!strictly_rising(&[1.0, 2.0, 2.0]));
        assert!(!strictly_rising(&[1.0, f64::NAN, 3.0]));
        assert!(!strictly_rising(&[1.0]));

        assert!(endpoint_rising(&[1.0, 0.5, 1.1]));
        assert!(!endpoint_rising(&[1.0, 5.0, 1.0]));
        assert!(!endpoint_rising(&[f64::NAN, 2.0]));
        assert!(!endpoint_rising(&[]));
    }

    #[test]
    fn bias_guards_zero_and_nan() {
        assert_eq!(bias_pct(110.0, 100.0), Some(10.0));
        assert!(bias_pct(1.0, 0.0).is_none());
        assert!(bias_pct(f64::NAN, 1.0).is_none());
        assert!(bias_pct(1.0, f64::INFINITY).is_none());
    }
}
