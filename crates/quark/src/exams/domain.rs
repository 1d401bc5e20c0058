use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::terms::TermKey;

/// Identifier assigned to an uploaded exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(pub u64);

/// Identifier assigned to a flag raised against an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagId(pub u64);

/// One course taught in one term (e.g. `cs61a-fa2012`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseOfferingId(pub String);

/// Account whose permission decision applies to an exam.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for ExamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FlagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CourseOfferingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamNumber {
    Mt1,
    Mt2,
    Mt3,
    Final,
    Quiz1,
    Quiz2,
}

impl ExamNumber {
    pub fn code(self) -> &'static str {
        match self {
            ExamNumber::Mt1 => "mt1",
            ExamNumber::Mt2 => "mt2",
            ExamNumber::Mt3 => "mt3",
            ExamNumber::Final => "final",
            ExamNumber::Quiz1 => "quiz1",
            ExamNumber::Quiz2 => "quiz2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExamType {
    #[serde(rename = "exam")]
    Exam,
    #[serde(rename = "sol")]
    Solution,
}

impl ExamType {
    pub fn code(self) -> &'static str {
        match self {
            ExamType::Exam => "exam",
            ExamType::Solution => "sol",
        }
    }
}

/// Upload payload; ids and timestamps are assigned by the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDraft {
    pub offering: CourseOfferingId,
    /// Short course label used in file names, e.g. `CS61A`.
    pub course: String,
    pub term: TermKey,
    #[serde(default)]
    pub instructors: Vec<String>,
    pub number: ExamNumber,
    pub exam_type: ExamType,
    pub file_ext: String,
}

/// A past exam stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    pub offering: CourseOfferingId,
    pub course: String,
    pub term: TermKey,
    pub instructors: Vec<String>,
    pub number: ExamNumber,
    pub exam_type: ExamType,
    pub file_ext: String,
    pub verified: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl Exam {
    pub fn from_draft(id: ExamId, draft: ExamDraft, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            offering: draft.offering,
            course: draft.course,
            term: draft.term,
            instructors: draft.instructors,
            number: draft.number,
            exam_type: draft.exam_type,
            file_ext: normalize_extension(&draft.file_ext),
            verified: false,
            uploaded_at,
        }
    }

    /// `<course>-<term>-<number>-<instructors>-<type><ext>`, with instructor names
    /// sorted and joined by underscores.
    pub fn file_name(&self) -> String {
        let mut instructors = self.instructors.clone();
        instructors.sort();
        let term = self
            .term
            .url_name()
            .unwrap_or_else(|| self.term.to_string());
        format!(
            "{course}-{term}-{number}-{instructors}-{exam_type}{ext}",
            course = self.course,
            number = self.number.code(),
            instructors = instructors.join("_"),
            exam_type = self.exam_type.code(),
            ext = self.file_ext,
        )
    }

    /// Newest upload first; identical timestamps fall back to the later id.
    pub fn recency_order(a: &Exam, b: &Exam) -> std::cmp::Ordering {
        b.uploaded_at
            .cmp(&a.uploaded_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}

fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('.').to_ascii_lowercase();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{trimmed}")
    }
}

/// A user report that an exam is invalid or a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamFlag {
    pub id: FlagId,
    pub exam: ExamId,
    pub reason: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-user allow/deny decision for one exam; keyed by `(exam, user)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverride {
    pub exam: ExamId,
    pub user: UserId,
    pub permission_allowed: bool,
    pub decided_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> ExamDraft {
        ExamDraft {
            offering: CourseOfferingId("test100-sp2013".to_string()),
            course: "test100".to_string(),
            term: TermKey(20132),
            instructors: vec!["Tau".to_string(), "Beta".to_string()],
            number: ExamNumber::Mt1,
            exam_type: ExamType::Exam,
            file_ext: "TXT".to_string(),
        }
    }

    #[test]
    fn file_name_matches_archive_convention() {
        let uploaded = Utc.with_ymd_and_hms(2013, 3, 1, 12, 0, 0).unwrap();
        let exam = Exam::from_draft(ExamId(1), draft(), uploaded);

        assert!(!exam.verified);
        assert_eq!(exam.file_ext, ".txt");
        assert_eq!(exam.file_name(), "test100-sp2013-mt1-Beta_Tau-exam.txt");
    }

    #[test]
    fn recency_order_breaks_timestamp_ties_by_id() {
        let uploaded = Utc.with_ymd_and_hms(2013, 3, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2013, 3, 2, 12, 0, 0).unwrap();
        let mut exams = vec![
            Exam::from_draft(ExamId(1), draft(), uploaded),
            Exam::from_draft(ExamId(2), draft(), uploaded),
            Exam::from_draft(ExamId(3), draft(), later),
        ];
        exams.sort_by(Exam::recency_order);

        let ids: Vec<_> = exams.iter().map(|exam| exam.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn ids_display_their_inner_value() {
        assert_eq!(ExamId(7).to_string(), "7");
        assert_eq!(FlagId(12).to_string(), "12");
        assert_eq!(
            CourseOfferingId("cs61a-fa2012".to_string()).to_string(),
            "cs61a-fa2012"
        );
        assert_eq!(UserId("beta".to_string()).to_string(), "beta");
    }

    #[test]
    fn codes_serialize_in_wire_form() {
        assert_eq!(
            serde_json::to_string(&ExamNumber::Final).expect("serializes"),
            "\"final\""
        );
        assert_eq!(
            serde_json::to_string(&ExamType::Solution).expect("serializes"),
            "\"sol\""
        );
    }
}
