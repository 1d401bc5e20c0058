use crate::cli::ServeArgs;
use crate::infra::{build_services, AppState};
use crate::routes::with_domain_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use quark::config::AppConfig;
use quark::error::AppError;
use quark::telemetry;
use quark::terms::TermImporter;
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

    let (term_service, exam_service) = build_services(&config);
    if let Some(path) = args.terms_csv.take() {
        let summary = TermImporter::from_path(&path, term_service.as_ref())?;
        info!(
            path = %path.display(),
            imported = summary.imported,
            "seeded term calendar"
        );
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_domain_routes(term_service, exam_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        flag_limit = config.exams.flag_limit,
        "term and exam archive service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
