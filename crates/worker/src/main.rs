use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use takeoff_core::domain::evaluation::TrendMode;
use takeoff_core::ingest::cache::CachedSeriesProvider;
use takeoff_core::ingest::memory::InMemorySeriesProvider;
use takeoff_core::ingest::yahoo::YahooChartProvider;
use takeoff_core::ingest::SeriesProvider;
use takeoff_core::scan::{run_scan, ScanOptions};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod report;

#[derive(Debug, Parser)]
#[command(name = "takeoff_worker")]
struct Args {
    /// Evaluate only the N highest-volume tickers. Defaults to SCAN_TOP_N or 80.
    #[arg(long)]
    top_n: Option<usize>,

    /// Require 10 consecutive daily increases instead of a higher endpoint.
    #[arg(long, conflicts_with = "lenient")]
    strict: bool,

    /// Only require the trend endpoints to rise, even when SCAN_STRICT is set.
    #[arg(long)]
    lenient: bool,

    /// Comma-separated symbols overriding the configured universe.
    #[arg(long)]
    symbols: Option<String>,

    /// Read bars from a JSON fixture instead of the network.
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Print the full report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = takeoff_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(&settings, args).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "scan run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(settings: &takeoff_core::config::Settings, args: Args) -> anyhow::Result<()> {
    let opts = apply_overrides(ScanOptions::from_env(), &args);

    let fixture = match &args.fixtures {
        Some(path) => {
            let fixture = InMemorySeriesProvider::from_file(path)?;
            tracing::info!(path = %path.display(), symbols = fixture.symbols().len(), "loaded fixtures");
            Some(fixture)
        }
        None => None,
    };

    // Fixture runs default to the fixture's own symbols unless a universe is configured.
    let universe = match (args.symbols.as_deref(), &fixture) {
        (Some(s), _) => takeoff_core::universe::parse_symbols(s),
        (None, Some(f)) if std::env::var("SCAN_UNIVERSE").is_err() => f.symbols(),
        _ => takeoff_core::universe::configured_universe(),
    };

    let provider: Arc<dyn SeriesProvider> = match fixture {
        Some(f) => Arc::new(f),
        None => Arc::new(CachedSeriesProvider::new(
            YahooChartProvider::from_settings(settings)?,
            settings.series_cache_ttl,
        )),
    };

    anyhow::ensure!(!universe.is_empty(), "ticker universe is empty");

    tracing::info!(
        universe = universe.len(),
        top_n = opts.top_n,
        mode = ?opts.mode,
        provider = provider.provider_name(),
        "starting scan"
    );

    let report = run_scan(provider.as_ref(), &universe, &opts).await?;

    tracing::info!(
        matches = report.matches.len(),
        ranked = report.ranked.len(),
        failures = report.failures,
        "scan complete"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report::render_table(&report.matches));
    }
    Ok(())
}

/// CLI flags win over environment defaults.
fn apply_overrides(mut opts: ScanOptions, args: &Args) -> ScanOptions {
    if let Some(n) = args.top_n {
        opts.top_n = n;
    }
    if args.strict {
        opts.mode = TrendMode::Strict;
    } else if args.lenient {
        opts.mode = TrendMode::Lenient;
    }
    opts
}

fn init_sentry(settings: &takeoff_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
