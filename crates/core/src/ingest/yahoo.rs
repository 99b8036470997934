use crate::config::Settings;
use crate::domain::bar::RawBar;
use crate::ingest::{Lookback, SeriesProvider};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;

// Chart endpoints reject the default reqwest user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Daily bars from the public v8 chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .series_provider_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("SERIES_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("SERIES_PROVIDER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build series provider http client")?;

        Ok(Self {
            http,
            base_url,
            retries,
        })
    }

    fn url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol.trim()
        )
    }

    async fn fetch_once(&self, symbol: &str, lookback: Lookback) -> Result<Fetched> {
        let res = self
            .http
            .get(self.url(symbol))
            .query(&[
                ("range", lookback.as_range()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
            .context("chart request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read chart response")?;

        if status == StatusCode::NOT_FOUND {
            return Ok(Fetched::Bars(Vec::new()));
        }
        if !status.is_success() {
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            return Ok(Fetched::HttpError {
                status,
                retryable,
                body: text,
            });
        }

        let parsed = serde_json::from_str::<ChartResponse>(&text)
            .context("failed to parse chart response")?;
        Ok(Fetched::Bars(parsed.into_raw_bars()?))
    }
}

enum Fetched {
    Bars(Vec<RawBar>),
    HttpError {
        status: StatusCode,
        retryable: bool,
        body: String,
    },
}

#[async_trait::async_trait]
impl SeriesProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_daily_bars(&self, symbol: &str, lookback: Lookback) -> Result<Vec<RawBar>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match self.fetch_once(symbol, lookback).await {
                Ok(Fetched::Bars(bars)) => return Ok(bars),
                Ok(Fetched::HttpError {
                    status,
                    retryable,
                    body,
                }) => {
                    let err = anyhow::anyhow!("chart HTTP {status} for {symbol}: {body}");
                    if !retryable {
                        return Err(err);
                    }
                    err
                }
                Err(err) => err,
            };

            if attempt >= self.retries {
                return Err(err);
            }
            let backoff = Duration::from_secs(1 << (attempt - 1));
            tracing::warn!(
                attempt,
                ?backoff,
                ticker = %symbol,
                error = %err,
                "chart fetch failed; retrying"
            );
            tokio::time::sleep(backoff).await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResponse {
    fn into_raw_bars(self) -> Result<Vec<RawBar>> {
        if let Some(err) = self.chart.error {
            // "Not Found" means the symbol has no data, which is not a failure.
            if err.code.eq_ignore_ascii_case("Not Found") {
                return Ok(Vec::new());
            }
            anyhow::bail!("chart error {}: {}", err.code, err.description);
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

        let mut out = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let Some(date) = exchange_date(*ts, result.meta.gmtoffset) else {
                continue;
            };
            out.push(RawBar {
                date,
                close: quote.close.get(i).copied().flatten(),
                volume: quote.volume.get(i).copied().flatten(),
            });
        }
        Ok(out)
    }
}

fn exchange_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts.checked_add(gmtoffset)?, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_chart_shape_with_null_rows() {
        // 2026-10-15 01:00:00 UTC and 2026-10-16 01:00:00 UTC, exchange offset +8h.
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "2330.TW", "gmtoffset": 28800},
                    "timestamp": [1_792_026_000_i64, 1_792_112_400_i64],
                    "indicators": {"quote": [{
                        "open": [1440.0, 1450.0],
                        "close": [1445.0, null],
                        "volume": [25_000_000, 31_000_000]
                    }]}
                }],
                "error": null
            }
        });

        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        let bars = parsed.into_raw_bars().unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
        assert_eq!(bars[0].close, Some(1445.0));
        assert_eq!(bars[1].close, None);
        assert_eq!(bars[1].volume, Some(31_000_000.0));
    }

    #[test]
    fn not_found_error_is_empty() {
        let v = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        });
        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        assert!(parsed.into_raw_bars().unwrap().is_empty());
    }

    #[test]
    fn other_chart_errors_fail() {
        let v = json!({
            "chart": {
                "result": null,
                "error": {"code": "Bad Request", "description": "Invalid input - interval=1x"}
            }
        });
        let parsed: ChartResponse = serde_json::from_value(v).unwrap();
        assert!(parsed.into_raw_bars().is_err());
    }

    #[test]
    fn empty_result_is_empty() {
        let parsed: ChartResponse =
            serde_json::from_value(json!({"chart": {"result": [], "error": null}})).unwrap();
        assert!(parsed.into_raw_bars().unwrap().is_empty());
    }
}
