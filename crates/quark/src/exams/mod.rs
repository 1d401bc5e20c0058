//! Past-exam archive: uploads, user flags, permission overrides, and the
//! visibility rules that decide which exams are listed.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod visibility;

#[cfg(test)]
mod tests;

pub use domain::{
    CourseOfferingId, Exam, ExamDraft, ExamFlag, ExamId, ExamNumber, ExamType, FlagId,
    PermissionOverride, UserId,
};
pub use repository::{ExamRepository, ExamStatusView, FlagInsert};
pub use router::{exam_router, FlagRequest, PermissionRequest, VerifyRequest};
pub use service::{ExamService, ExamServiceError};
pub use visibility::{
    is_blacklisted, unresolved_flag_count, ExamVisibility, VisibilityPolicy, DEFAULT_FLAG_LIMIT,
};
