pub mod domain;
pub mod ingest;
pub mod scan;
pub mod strategy;
pub mod universe;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_CACHE_TTL_SECS: u64 = 600;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub series_provider_base_url: Option<String>,
        pub series_cache_ttl: Duration,
        pub port: Option<u16>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let series_cache_ttl = match std::env::var("SERIES_CACHE_TTL_SECS") {
                Ok(s) => Duration::from_secs(
                    s.trim()
                        .parse::<u64>()
                        .with_context(|| format!("SERIES_CACHE_TTL_SECS is not a number: {s}"))?,
                ),
                Err(_) => Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            };

            let port = match std::env::var("PORT") {
                Ok(s) => Some(
                    s.trim()
                        .parse::<u16>()
                        .with_context(|| format!("PORT is not a valid port: {s}"))?,
                ),
                Err(_) => None,
            };

            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok().filter(|s| !s.trim().is_empty()),
                series_provider_base_url: std::env::var("SERIES_PROVIDER_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                series_cache_ttl,
                port,
            })
        }
    }
}
