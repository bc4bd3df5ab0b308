use crate::cli::ServeArgs;
use crate::infra::{load_catalogs, AppState, ConfiguredStore};
use crate::routes::with_quote_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use study_quote::config::AppConfig;
use study_quote::error::AppError;
use study_quote::telemetry;
use study_quote::workflows::quote::QuoteService;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalogs = load_catalogs(&config.quote)?;
    let store = Arc::new(ConfiguredStore::from_config(&config.store));
    let service = Arc::new(QuoteService::new(
        catalogs,
        config.quote.discount.clone(),
        store,
        config.quote.display(),
    )
    .with_clock(config.quote.clock()));
    let schools = service.catalogs().len();

    let app = with_quote_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, schools, "quote service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
