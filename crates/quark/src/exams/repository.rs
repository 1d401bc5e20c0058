use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    CourseOfferingId, Exam, ExamDraft, ExamFlag, ExamId, FlagId, PermissionOverride, UserId,
};
use super::visibility::ExamVisibility;
use crate::repository::RepositoryError;

/// Storage abstraction for exams, their flags, and permission overrides.
pub trait ExamRepository: Send + Sync {
    /// Stores a new, unverified exam under a freshly assigned id.
    fn insert_exam(
        &self,
        draft: ExamDraft,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Exam, RepositoryError>;
    fn update_exam(&self, exam: Exam) -> Result<(), RepositoryError>;
    fn fetch_exam(&self, id: ExamId) -> Result<Option<Exam>, RepositoryError>;
    fn exams_for_offering(&self, offering: &CourseOfferingId)
        -> Result<Vec<Exam>, RepositoryError>;
    /// Removes the exam together with its flags and overrides.
    fn delete_exam(&self, id: ExamId) -> Result<Exam, RepositoryError>;

    /// Fails with `NotFound` when the exam does not exist. The unresolved counts
    /// are taken in the same atomic unit as the insert.
    fn insert_flag(
        &self,
        exam: ExamId,
        reason: String,
        created_at: DateTime<Utc>,
    ) -> Result<FlagInsert, RepositoryError>;
    fn update_flag(&self, flag: ExamFlag) -> Result<(), RepositoryError>;
    fn fetch_flag(&self, id: FlagId) -> Result<Option<ExamFlag>, RepositoryError>;
    fn flags_for(&self, exam: ExamId) -> Result<Vec<ExamFlag>, RepositoryError>;

    /// Last write for an `(exam, user)` pair wins.
    fn put_override(&self, decision: PermissionOverride) -> Result<(), RepositoryError>;
    /// Returns whether an override existed.
    fn remove_override(&self, exam: ExamId, user: &UserId) -> Result<bool, RepositoryError>;
    fn overrides_for(&self, exam: ExamId) -> Result<Vec<PermissionOverride>, RepositoryError>;
}

/// A stored flag with the exam's unresolved flag count around the insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagInsert {
    pub flag: ExamFlag,
    pub unresolved_before: usize,
    pub unresolved_after: usize,
}

/// Exam metadata combined with its current visibility decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamStatusView {
    pub exam: Exam,
    pub file_name: String,
    #[serde(flatten)]
    pub visibility: ExamVisibility,
}
