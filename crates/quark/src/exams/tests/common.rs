use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::events::{DomainEvent, EventError, EventPublisher};
use crate::exams::domain::{CourseOfferingId, ExamDraft, ExamNumber, ExamType};
use crate::exams::{exam_router, ExamService, VisibilityPolicy};
use crate::memory::{MemoryStore, RecordingPublisher};
use crate::terms::TermKey;

pub(super) const OFFERING: &str = "test100-sp2013";

pub(super) fn offering() -> CourseOfferingId {
    CourseOfferingId(OFFERING.to_string())
}

pub(super) fn draft(number: ExamNumber) -> ExamDraft {
    ExamDraft {
        offering: offering(),
        course: "test100".to_string(),
        term: TermKey(20132),
        instructors: vec!["Tau".to_string(), "Beta".to_string()],
        number,
        exam_type: ExamType::Exam,
        file_ext: ".txt".to_string(),
    }
}

pub(super) fn uploaded_on(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2013, 3, day, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn policy() -> VisibilityPolicy {
    VisibilityPolicy { flag_limit: 5 }
}

pub(super) fn build_service() -> (
    ExamService<MemoryStore, RecordingPublisher>,
    Arc<MemoryStore>,
    Arc<RecordingPublisher>,
) {
    let store = Arc::new(MemoryStore::default());
    let events = Arc::new(RecordingPublisher::default());
    let service = ExamService::new(store.clone(), events.clone(), policy());
    (service, store, events)
}

pub(super) fn topics(events: &RecordingPublisher) -> Vec<String> {
    events.events().into_iter().map(|event| event.topic).collect()
}

/// Publisher that always fails, for error-path coverage.
#[derive(Default)]
pub(super) struct UnavailablePublisher;

impl EventPublisher for UnavailablePublisher {
    fn publish(&self, _event: DomainEvent) -> Result<(), EventError> {
        Err(EventError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) fn exam_router_with_service(
    service: ExamService<MemoryStore, RecordingPublisher>,
) -> axum::Router {
    exam_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
