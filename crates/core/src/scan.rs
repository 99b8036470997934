use crate::domain::bar::{BarSeries, RawBar};
use crate::domain::candidate::TickerCandidate;
use crate::domain::evaluation::{EvaluationResult, TrendMode};
use crate::ingest::{Lookback, SeriesProvider};
use crate::strategy::{evaluate_detailed, select_top_n, StrategyParams};
use anyhow::ensure;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

const MAX_LOGGED_FAILURES: usize = 10;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How many of the highest-volume tickers get a full evaluation.
    pub top_n: usize,
    pub mode: TrendMode,
    pub params: StrategyParams,
    /// Pause between upstream requests.
    pub req_delay: Duration,
    /// Log progress every N tickers (0 disables).
    pub progress_every: usize,
    pub snapshot_lookback: Lookback,
    pub series_lookback: Lookback,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            top_n: 80,
            mode: TrendMode::Lenient,
            params: StrategyParams::default(),
            req_delay: Duration::ZERO,
            progress_every: 20,
            snapshot_lookback: Lookback::Days(5),
            series_lookback: Lookback::Years(1),
        }
    }
}

impl ScanOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("SCAN_TOP_N") {
            if let Ok(n) = s.parse::<usize>() {
                out.top_n = n;
            }
        }

        if let Ok(s) = std::env::var("SCAN_STRICT") {
            out.mode = TrendMode::from_strict_flag(matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            ));
        }

        if let Ok(s) = std::env::var("SCAN_REQ_DELAY_MS") {
            if let Ok(n) = s.parse::<u64>() {
                out.req_delay = Duration::from_millis(n);
            }
        }

        if let Ok(s) = std::env::var("SCAN_PROGRESS_EVERY") {
            if let Ok(n) = s.parse::<usize>() {
                out.progress_every = n;
            }
        }

        out
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.top_n >= 1, "top_n must be >= 1 (got {})", self.top_n);
        self.params.validate()
    }
}

/// Outcome of one scan pass. Matches are ordered by volume, highest first.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub provider: String,
    pub mode: TrendMode,
    pub universe_len: usize,
    pub ranked: Vec<TickerCandidate>,
    pub failures: usize,
    pub matches: Vec<EvaluationResult>,
}

/// Ranks the universe by latest volume, then evaluates the top `opts.top_n` tickers.
///
/// Per-ticker fetch failures are counted and logged; they never abort the pass.
pub async fn run_scan<P>(
    provider: &P,
    universe: &[String],
    opts: &ScanOptions,
) -> anyhow::Result<ScanReport>
where
    P: SeriesProvider + ?Sized,
{
    opts.validate()?;

    let mut pacer = Pacer::new(opts.req_delay);
    let mut failures = Failures::default();

    let snapshot = snapshot_candidates(provider, universe, opts, &mut pacer, &mut failures).await;
    let ranked = select_top_n(snapshot, opts.top_n);

    tracing::info!(
        universe = universe.len(),
        ranked = ranked.len(),
        mode = ?opts.mode,
        "ranked candidates by volume; evaluating"
    );

    let total = ranked.len();
    let mut matches = Vec::new();
    for (idx, candidate) in ranked.iter().enumerate() {
        pacer.wait().await;

        match provider
            .fetch_daily_bars(&candidate.symbol, opts.series_lookback)
            .await
        {
            Ok(raws) => {
                let series = BarSeries::from_raw(candidate.symbol.clone(), &raws);
                match evaluate_detailed(&series, opts.mode, &opts.params) {
                    Ok(hit) => matches.push(hit),
                    Err(reason) => {
                        tracing::debug!(ticker = %candidate.symbol, %reason, "no match");
                    }
                }
            }
            Err(err) => failures.record(&candidate.symbol, "series", &err),
        }

        if opts.progress_every != 0 {
            let n = idx + 1;
            if n == 1 || n == total || n % opts.progress_every == 0 {
                tracing::info!(
                    processed = n,
                    total,
                    matches = matches.len(),
                    failures = failures.count,
                    "scan progress"
                );
            }
        }
    }

    // Evaluation order is not part of the contract; the final order is.
    matches.sort_by(|a, b| b.volume.cmp(&a.volume));

    Ok(ScanReport {
        generated_at: Utc::now(),
        provider: provider.provider_name().to_string(),
        mode: opts.mode,
        universe_len: universe.len(),
        ranked,
        failures: failures.count,
        matches,
    })
}

async fn snapshot_candidates<P>(
    provider: &P,
    universe: &[String],
    opts: &ScanOptions,
    pacer: &mut Pacer,
    failures: &mut Failures,
) -> Vec<TickerCandidate>
where
    P: SeriesProvider + ?Sized,
{
    let mut out = Vec::with_capacity(universe.len());
    for symbol in universe {
        pacer.wait().await;

        let raws = match provider
            .fetch_daily_bars(symbol, opts.snapshot_lookback)
            .await
        {
            Ok(raws) => raws,
            Err(err) => {
                failures.record(symbol, "snapshot", &err);
                continue;
            }
        };

        match latest_volume(&raws) {
            Some(volume) => out.push(TickerCandidate::new(symbol.clone(), volume)),
            None => tracing::debug!(ticker = %symbol, "no volume on latest row; skipping"),
        }
    }
    out
}

/// Volume of the newest row only. A missing or zero value there skips the ticker rather than
/// falling back to an older session.
fn latest_volume(raws: &[RawBar]) -> Option<u64> {
    let volume = raws.last()?.volume.filter(|v| v.is_finite() && *v >= 1.0)?;
    Some(volume.trunc() as u64)
}

struct Pacer {
    delay: Duration,
    first: bool,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self { delay, first: true }
    }

    async fn wait(&mut self) {
        if self.first {
            self.first = false;
            return;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[derive(Default)]
struct Failures {
    count: usize,
}

impl Failures {
    fn record(&mut self, symbol: &str, stage: &'static str, err: &anyhow::Error) {
        self.count += 1;
        if self.count <= MAX_LOGGED_FAILURES {
            tracing::warn!(
                ticker = %symbol,
                stage,
                failure_count = self.count,
                error = %err,
                "fetch failed; skipping ticker"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    fn row(day: u32, volume: Option<f64>) -> RawBar {
        RawBar {
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            close: Some(100.0),
            volume,
        }
    }

    #[test]
    fn latest_volume_uses_only_the_newest_row() {
        assert_eq!(latest_volume(&[row(14, Some(900.0)), row(15, Some(1_200.6))]), Some(1_200));
        assert_eq!(latest_volume(&[row(14, Some(900.0)), row(15, None)]), None);
        assert_eq!(latest_volume(&[row(14, Some(900.0)), row(15, Some(f64::NAN))]), None);
        assert_eq!(latest_volume(&[row(14, Some(900.0)), row(15, Some(0.0))]), None);
        assert_eq!(latest_volume(&[]), None);
    }

    #[test]
    fn default_options_are_valid() {
        assert!(ScanOptions::default().validate().is_ok());
        let zero = ScanOptions {
            top_n: 0,
            ..ScanOptions::default()
        };
        assert!(zero.validate().is_err());
    }
}
