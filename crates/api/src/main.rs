use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use takeoff_core::domain::candidate::TickerCandidate;
use takeoff_core::domain::evaluation::TrendMode;
use takeoff_core::ingest::cache::CachedSeriesProvider;
use takeoff_core::ingest::yahoo::YahooChartProvider;
use takeoff_core::ingest::SeriesProvider;
use takeoff_core::scan::{run_scan, ScanOptions, ScanReport};

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = takeoff_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let provider = YahooChartProvider::from_settings(&settings).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        e
    })?;
    let provider: Arc<dyn SeriesProvider> =
        Arc::new(CachedSeriesProvider::new(provider, settings.series_cache_ttl));

    let defaults = ScanOptions::from_env();
    defaults.validate()?;

    let state = AppState {
        provider,
        universe: Arc::new(takeoff_core::universe::configured_universe()),
        defaults,
        scan_lock: Arc::new(tokio::sync::Mutex::new(())),
    };

    let (listed, otc) = takeoff_core::universe::segment_counts(&state.universe);
    tracing::info!(
        universe = state.universe.len(),
        listed,
        otc,
        cache_ttl_secs = settings.series_cache_ttl.as_secs(),
        "scan service configured"
    );

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/universe", get(get_universe))
        .route("/scan", get(get_scan))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port = settings.port.unwrap_or(DEFAULT_PORT);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn SeriesProvider>,
    universe: Arc<Vec<String>>,
    defaults: ScanOptions,
    // One scan at a time; a second caller gets 409 rather than doubling upstream load.
    scan_lock: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Debug, Default, Deserialize)]
struct ScanQuery {
    top_n: Option<usize>,
    strict: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ApiScan {
    scan_id: Uuid,
    #[serde(flatten)]
    report: ScanReport,
}

async fn get_universe(State(state): State<AppState>) -> Json<Vec<TickerCandidate>> {
    Json(takeoff_core::universe::as_candidates(&state.universe))
}

async fn get_scan(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ApiScan>, StatusCode> {
    let opts = scan_options(&state.defaults, &query)?;

    let Ok(_guard) = state.scan_lock.try_lock() else {
        tracing::warn!("scan requested while another scan is running");
        return Err(StatusCode::CONFLICT);
    };

    let scan_id = Uuid::new_v4();
    tracing::info!(%scan_id, top_n = opts.top_n, mode = ?opts.mode, "scan started");

    let report = run_scan(state.provider.as_ref(), &state.universe, &opts)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(%scan_id, error = %e, "scan failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    tracing::info!(
        %scan_id,
        matches = report.matches.len(),
        failures = report.failures,
        "scan finished"
    );

    Ok(Json(ApiScan { scan_id, report }))
}

fn scan_options(defaults: &ScanOptions, query: &ScanQuery) -> Result<ScanOptions, StatusCode> {
    let mut opts = defaults.clone();
    if let Some(n) = query.top_n {
        opts.top_n = n;
    }
    if let Some(strict) = query.strict {
        opts.mode = TrendMode::from_strict_flag(strict);
    }
    opts.validate().map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok(opts)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
