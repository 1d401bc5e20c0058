use metrics_exporter_prometheus::PrometheusHandle;
use quark::config::AppConfig;
use quark::events::TracingPublisher;
use quark::exams::ExamService;
use quark::memory::MemoryStore;
use quark::terms::TermService;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type SharedTermService = Arc<TermService<MemoryStore, TracingPublisher>>;
pub(crate) type SharedExamService = Arc<ExamService<MemoryStore, TracingPublisher>>;

/// Term and exam services sharing one store and the log-backed event publisher.
pub(crate) fn build_services(config: &AppConfig) -> (SharedTermService, SharedExamService) {
    let store = Arc::new(MemoryStore::default());
    let events = Arc::new(TracingPublisher);

    let terms = Arc::new(TermService::new(
        store.clone(),
        events.clone(),
        config.terms.system,
    ));
    let exams = Arc::new(ExamService::new(
        store,
        events,
        config.exams.visibility_policy(),
    ));
    (terms, exams)
}
