//! Exam archive scenarios exercised through the public service facade.

use std::sync::Arc;

use quark::exams::{
    CourseOfferingId, ExamDraft, ExamId, ExamNumber, ExamService, ExamType, UserId,
    VisibilityPolicy,
};
use quark::memory::{MemoryStore, RecordingPublisher};
use quark::terms::TermKey;

fn service() -> ExamService<MemoryStore, RecordingPublisher> {
    ExamService::new(
        Arc::new(MemoryStore::default()),
        Arc::new(RecordingPublisher::default()),
        VisibilityPolicy { flag_limit: 5 },
    )
}

fn draft(offering: &str, number: ExamNumber) -> ExamDraft {
    ExamDraft {
        offering: CourseOfferingId(offering.to_string()),
        course: "CS61A".to_string(),
        term: TermKey(20124),
        instructors: vec!["Garcia".to_string()],
        number,
        exam_type: ExamType::Exam,
        file_ext: "pdf".to_string(),
    }
}

fn verified_exam(service: &ExamService<MemoryStore, RecordingPublisher>, number: ExamNumber) -> ExamId {
    let exam = service
        .upload(draft("cs61a-fa2012", number))
        .expect("uploads");
    service.verify(exam.id, true).expect("verifies");
    exam.id
}

fn visible_ids(service: &ExamService<MemoryStore, RecordingPublisher>) -> Vec<ExamId> {
    let mut ids: Vec<ExamId> = service
        .list_visible_exams(&CourseOfferingId("cs61a-fa2012".to_string()))
        .expect("lists")
        .into_iter()
        .map(|exam| exam.id)
        .collect();
    ids.sort();
    ids
}

#[test]
fn five_flags_visible_six_hidden_resolution_restores() {
    let service = service();
    let exam = verified_exam(&service, ExamNumber::Final);

    for _ in 0..5 {
        service.flag(exam, "duplicate").expect("flags");
    }
    assert!(service.is_visible(exam).expect("reads"));

    let sixth = service.flag(exam, "duplicate").expect("flags");
    assert!(!service.is_visible(exam).expect("reads"));

    service.resolve_flag(sixth.id).expect("resolves");
    assert!(service.is_visible(exam).expect("reads"));
}

#[test]
fn overlapping_blacklists_across_three_exams() {
    let service = service();
    let exam1 = verified_exam(&service, ExamNumber::Mt1);
    let exam2 = verified_exam(&service, ExamNumber::Mt2);
    let exam3 = verified_exam(&service, ExamNumber::Final);
    let first = UserId("instructor-1".to_string());
    let second = UserId("instructor-2".to_string());

    assert_eq!(visible_ids(&service), vec![exam1, exam2, exam3]);

    service
        .set_permission(exam1, first.clone(), false)
        .expect("denies");
    assert_eq!(visible_ids(&service), vec![exam2, exam3]);

    service
        .set_permission(exam1, second.clone(), false)
        .expect("denies");
    service
        .set_permission(exam2, second.clone(), false)
        .expect("denies");
    assert_eq!(visible_ids(&service), vec![exam3]);

    service
        .set_permission(exam2, second.clone(), true)
        .expect("allows");
    assert_eq!(visible_ids(&service), vec![exam2, exam3]);
    assert!(service.is_blacklisted(exam1).expect("reads"));

    service
        .clear_permission(exam1, &first)
        .expect("clears");
    assert!(service.is_blacklisted(exam1).expect("reads"));
    service
        .set_permission(exam1, second, true)
        .expect("allows");
    assert_eq!(visible_ids(&service), vec![exam1, exam2, exam3]);
}

#[test]
fn unverified_exams_stay_hidden_regardless_of_flags() {
    let service = service();
    let exam = verified_exam(&service, ExamNumber::Mt1);

    service.verify(exam, false).expect("unverifies");
    assert!(!service.is_visible(exam).expect("reads"));
    assert_eq!(service.flag_count(exam).expect("counts"), 0);
    assert!(!service.is_blacklisted(exam).expect("reads"));
}

#[test]
fn listings_are_scoped_to_the_offering() {
    let service = service();
    let listed = verified_exam(&service, ExamNumber::Mt1);
    let elsewhere = service
        .upload(draft("ee20-fa2012", ExamNumber::Mt1))
        .expect("uploads");
    service.verify(elsewhere.id, true).expect("verifies");

    assert_eq!(visible_ids(&service), vec![listed]);
}
