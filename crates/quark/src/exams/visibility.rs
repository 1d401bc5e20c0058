use serde::Serialize;

use super::domain::{Exam, ExamFlag, PermissionOverride};

/// Unresolved flags tolerated before an exam is hidden.
pub const DEFAULT_FLAG_LIMIT: usize = 5;

/// Thresholds deciding whether an exam is listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityPolicy {
    pub flag_limit: usize,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            flag_limit: DEFAULT_FLAG_LIMIT,
        }
    }
}

pub fn unresolved_flag_count(flags: &[ExamFlag]) -> usize {
    flags.iter().filter(|flag| !flag.resolved).count()
}

/// True when any override denies permission.
pub fn is_blacklisted(overrides: &[PermissionOverride]) -> bool {
    overrides
        .iter()
        .any(|decision| !decision.permission_allowed)
}

impl VisibilityPolicy {
    /// Verified, not blacklisted, and at most `flag_limit` unresolved flags.
    pub fn is_visible(&self, exam: &Exam, flag_count: usize, blacklisted: bool) -> bool {
        exam.verified && flag_count <= self.flag_limit && !blacklisted
    }

    pub fn assess(
        &self,
        exam: &Exam,
        flags: &[ExamFlag],
        overrides: &[PermissionOverride],
    ) -> ExamVisibility {
        let flag_count = unresolved_flag_count(flags);
        let blacklisted = is_blacklisted(overrides);
        ExamVisibility {
            flag_count,
            flag_limit: self.flag_limit,
            blacklisted,
            verified: exam.verified,
            visible: self.is_visible(exam, flag_count, blacklisted),
        }
    }
}

/// Snapshot of the inputs and outcome of a visibility decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExamVisibility {
    pub flag_count: usize,
    pub flag_limit: usize,
    pub blacklisted: bool,
    pub verified: bool,
    pub visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exams::domain::{
        CourseOfferingId, ExamDraft, ExamId, ExamNumber, ExamType, FlagId, UserId,
    };
    use crate::terms::TermKey;
    use chrono::Utc;

    fn exam(verified: bool) -> Exam {
        let mut exam = Exam::from_draft(
            ExamId(1),
            ExamDraft {
                offering: CourseOfferingId("cs61a-fa2012".to_string()),
                course: "CS61A".to_string(),
                term: TermKey(20124),
                instructors: vec!["Garcia".to_string()],
                number: ExamNumber::Final,
                exam_type: ExamType::Exam,
                file_ext: ".pdf".to_string(),
            },
            Utc::now(),
        );
        exam.verified = verified;
        exam
    }

    fn flags(unresolved: usize, resolved: usize) -> Vec<ExamFlag> {
        (0..unresolved + resolved)
            .map(|index| ExamFlag {
                id: FlagId(index as u64 + 1),
                exam: ExamId(1),
                reason: "duplicate".to_string(),
                resolved: index >= unresolved,
                created_at: Utc::now(),
            })
            .collect()
    }

    fn decision(user: &str, allowed: bool) -> PermissionOverride {
        PermissionOverride {
            exam: ExamId(1),
            user: UserId(user.to_string()),
            permission_allowed: allowed,
            decided_at: Utc::now(),
        }
    }

    #[test]
    fn only_unresolved_flags_count() {
        assert_eq!(unresolved_flag_count(&flags(3, 4)), 3);
        assert_eq!(unresolved_flag_count(&[]), 0);
    }

    #[test]
    fn flag_limit_is_inclusive() {
        let policy = VisibilityPolicy { flag_limit: 5 };
        let exam = exam(true);

        assert!(policy.assess(&exam, &flags(5, 0), &[]).visible);
        assert!(!policy.assess(&exam, &flags(6, 0), &[]).visible);
        assert!(policy.assess(&exam, &flags(5, 1), &[]).visible);
    }

    #[test]
    fn any_deny_blacklists() {
        assert!(!is_blacklisted(&[]));
        assert!(!is_blacklisted(&[decision("alice", true)]));
        assert!(is_blacklisted(&[
            decision("alice", true),
            decision("bob", false)
        ]));
    }

    #[test]
    fn all_eight_combinations_need_every_condition() {
        let policy = VisibilityPolicy::default();
        for verified in [true, false] {
            for over_limit in [true, false] {
                for blacklisted in [true, false] {
                    let exam = exam(verified);
                    let unresolved = if over_limit { DEFAULT_FLAG_LIMIT + 1 } else { 0 };
                    let overrides = if blacklisted {
                        vec![decision("instructor", false)]
                    } else {
                        Vec::new()
                    };

                    let outcome = policy.assess(&exam, &flags(unresolved, 0), &overrides);
                    assert_eq!(outcome.blacklisted, blacklisted);
                    assert_eq!(
                        outcome.visible,
                        verified && !over_limit && !blacklisted,
                        "verified={verified} over_limit={over_limit} blacklisted={blacklisted}"
                    );
                }
            }
        }
    }
}
