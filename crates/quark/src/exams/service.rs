use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::domain::{
    CourseOfferingId, Exam, ExamDraft, ExamFlag, ExamId, FlagId, PermissionOverride, UserId,
};
use super::repository::{ExamRepository, ExamStatusView};
use super::visibility::{is_blacklisted, unresolved_flag_count, VisibilityPolicy};
use crate::events::{DomainEvent, EventError, EventPublisher};
use crate::repository::RepositoryError;

/// Service composing the exam repository, visibility policy, and event hooks.
///
/// Every read recomputes from the stored flag and override rows; nothing is cached.
pub struct ExamService<R, P> {
    repository: Arc<R>,
    events: Arc<P>,
    policy: VisibilityPolicy,
}

impl<R, P> ExamService<R, P>
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    pub fn new(repository: Arc<R>, events: Arc<P>, policy: VisibilityPolicy) -> Self {
        Self {
            repository,
            events,
            policy,
        }
    }

    pub fn policy(&self) -> VisibilityPolicy {
        self.policy
    }

    pub fn upload(&self, draft: ExamDraft) -> Result<Exam, ExamServiceError> {
        self.upload_at(draft, Utc::now())
    }

    pub fn upload_at(
        &self,
        draft: ExamDraft,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Exam, ExamServiceError> {
        let exam = self.repository.insert_exam(draft, uploaded_at)?;
        info!(exam = %exam.id, offering = %exam.offering, "exam uploaded");
        Ok(exam)
    }

    pub fn get(&self, id: ExamId) -> Result<Exam, ExamServiceError> {
        let exam = self
            .repository
            .fetch_exam(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(exam)
    }

    pub fn flag_count(&self, id: ExamId) -> Result<usize, ExamServiceError> {
        self.get(id)?;
        let flags = self.repository.flags_for(id)?;
        Ok(unresolved_flag_count(&flags))
    }

    pub fn is_blacklisted(&self, id: ExamId) -> Result<bool, ExamServiceError> {
        self.get(id)?;
        let overrides = self.repository.overrides_for(id)?;
        Ok(is_blacklisted(&overrides))
    }

    pub fn is_visible(&self, id: ExamId) -> Result<bool, ExamServiceError> {
        Ok(self.status(id)?.visibility.visible)
    }

    pub fn status(&self, id: ExamId) -> Result<ExamStatusView, ExamServiceError> {
        let exam = self.get(id)?;
        self.status_of(exam)
    }

    fn status_of(&self, exam: Exam) -> Result<ExamStatusView, ExamServiceError> {
        let flags = self.repository.flags_for(exam.id)?;
        let overrides = self.repository.overrides_for(exam.id)?;
        let visibility = self.policy.assess(&exam, &flags, &overrides);
        Ok(ExamStatusView {
            file_name: exam.file_name(),
            exam,
            visibility,
        })
    }

    /// Visible exams for an offering, newest upload first.
    pub fn list_visible_exams(
        &self,
        offering: &CourseOfferingId,
    ) -> Result<Vec<Exam>, ExamServiceError> {
        let mut visible = Vec::new();
        for exam in self.repository.exams_for_offering(offering)? {
            let status = self.status_of(exam)?;
            if status.visibility.visible {
                visible.push(status.exam);
            }
        }
        visible.sort_by(Exam::recency_order);
        debug!(%offering, count = visible.len(), "listed visible exams");
        Ok(visible)
    }

    /// Record a user report against an exam.
    pub fn flag(&self, id: ExamId, reason: impl Into<String>) -> Result<ExamFlag, ExamServiceError> {
        let inserted = self.repository.insert_flag(id, reason.into(), Utc::now())?;
        let flag = inserted.flag;
        let after = inserted.unresolved_after;
        info!(exam = %id, flag = %flag.id, unresolved = after, "exam flagged");

        self.events.publish(
            DomainEvent::new("exam.flagged", id.to_string())
                .with_detail("flag", flag.id)
                .with_detail("reason", &flag.reason)
                .with_detail("unresolved_flags", after),
        )?;

        if inserted.unresolved_before <= self.policy.flag_limit && after > self.policy.flag_limit {
            self.events.publish(
                DomainEvent::new("exam.flag_limit_exceeded", id.to_string())
                    .with_detail("unresolved_flags", after)
                    .with_detail("flag_limit", self.policy.flag_limit),
            )?;
        }

        Ok(flag)
    }

    pub fn resolve_flag(&self, id: FlagId) -> Result<ExamFlag, ExamServiceError> {
        let mut flag = self
            .repository
            .fetch_flag(id)?
            .ok_or(RepositoryError::NotFound)?;
        if !flag.resolved {
            flag.resolved = true;
            self.repository.update_flag(flag.clone())?;
            info!(flag = %id, exam = %flag.exam, "exam flag resolved");
        }
        Ok(flag)
    }

    /// Reviewer decision on whether the upload is a genuine exam.
    pub fn verify(&self, id: ExamId, verified: bool) -> Result<ExamStatusView, ExamServiceError> {
        let mut exam = self.get(id)?;
        if exam.verified != verified {
            exam.verified = verified;
            self.repository.update_exam(exam.clone())?;
            info!(exam = %id, verified, "exam verification changed");
        }
        self.status_of(exam)
    }

    pub fn set_permission(
        &self,
        id: ExamId,
        user: UserId,
        allowed: bool,
    ) -> Result<ExamStatusView, ExamServiceError> {
        let exam = self.get(id)?;
        self.repository.put_override(PermissionOverride {
            exam: id,
            user: user.clone(),
            permission_allowed: allowed,
            decided_at: Utc::now(),
        })?;
        info!(exam = %id, %user, allowed, "exam permission recorded");
        self.status_of(exam)
    }

    pub fn clear_permission(
        &self,
        id: ExamId,
        user: &UserId,
    ) -> Result<ExamStatusView, ExamServiceError> {
        let exam = self.get(id)?;
        if self.repository.remove_override(id, user)? {
            info!(exam = %id, %user, "exam permission cleared");
        }
        self.status_of(exam)
    }

    /// Remove an exam and its rows; the stored file is released through the
    /// `exam.deleted` event.
    pub fn delete(&self, id: ExamId) -> Result<Exam, ExamServiceError> {
        let exam = self.repository.delete_exam(id)?;
        info!(exam = %id, "exam deleted");
        self.events.publish(
            DomainEvent::new("exam.deleted", id.to_string())
                .with_detail("file_name", exam.file_name())
                .with_detail("offering", &exam.offering),
        )?;
        Ok(exam)
    }
}

/// Error raised by the exam service.
#[derive(Debug, thiserror::Error)]
pub enum ExamServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Event(#[from] EventError),
}
