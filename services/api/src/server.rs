use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use estate_market::accounts::session_layer;
use estate_market::config::AppConfig;
use estate_market::error::AppError;
use estate_market::listings::FsImageStore;
use estate_market::router::{market_router, MarketState};
use estate_market::store::MarketStore;
use estate_market::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let store = Arc::new(match &config.storage.data_file {
        Some(path) => MarketStore::open(path)?,
        None => MarketStore::in_memory(),
    });
    let images = Arc::new(FsImageStore::open(&config.storage.upload_dir)?);
    let sessions = session_layer(config.environment.secure_cookies());

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        uploads: images.clone(),
    };

    let market = MarketState::new(store.clone(), store, images);
    let app = with_service_routes(market_router(market, sessions))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        upload_dir = %config.storage.upload_dir.display(),
        persistent = config.storage.data_file.is_some(),
        "estate market ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
