//! In-process adapters for the persistence and event traits.
//!
//! All tables sit behind one mutex, so every repository call is a single atomic
//! unit; that is what makes the current-term swap safe under concurrent writers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::events::{DomainEvent, EventError, EventPublisher};
use crate::exams::{
    CourseOfferingId, Exam, ExamDraft, ExamFlag, ExamId, ExamRepository, FlagId, FlagInsert,
    PermissionOverride, UserId,
};
use crate::repository::RepositoryError;
use crate::terms::{Term, TermKey, TermRepository, TermSaveOutcome};

#[derive(Debug, Default)]
struct Tables {
    terms: BTreeMap<TermKey, Term>,
    exams: BTreeMap<ExamId, Exam>,
    flags: BTreeMap<FlagId, ExamFlag>,
    overrides: BTreeMap<(ExamId, UserId), PermissionOverride>,
    next_exam_id: u64,
    next_flag_id: u64,
}

impl Tables {
    fn allocate_exam_id(&mut self) -> ExamId {
        self.next_exam_id += 1;
        ExamId(self.next_exam_id)
    }

    fn allocate_flag_id(&mut self) -> FlagId {
        self.next_flag_id += 1;
        FlagId(self.next_flag_id)
    }
}

/// Shared in-memory store implementing every repository trait.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl TermRepository for MemoryStore {
    fn fetch(&self, key: TermKey) -> Result<Option<Term>, RepositoryError> {
        Ok(self.tables()?.terms.get(&key).cloned())
    }

    fn list(&self) -> Result<Vec<Term>, RepositoryError> {
        Ok(self.tables()?.terms.values().cloned().collect())
    }

    fn current(&self) -> Result<Option<Term>, RepositoryError> {
        Ok(self
            .tables()?
            .terms
            .values()
            .find(|term| term.current)
            .cloned())
    }

    fn save(&self, term: Term) -> Result<TermSaveOutcome, RepositoryError> {
        let key = term.key.unwrap_or_else(|| term.computed_key());
        let mut tables = self.tables()?;

        let was_current = tables
            .terms
            .get(&key)
            .map(|existing| existing.current)
            .unwrap_or(false);

        let mut demoted = Vec::new();
        if term.current {
            for (other_key, other) in tables.terms.iter_mut() {
                if *other_key != key && other.current {
                    other.current = false;
                    demoted.push(*other_key);
                }
            }
        }

        let mut stored = term;
        stored.key = Some(key);
        tables.terms.insert(key, stored.clone());

        Ok(TermSaveOutcome {
            term: stored,
            demoted,
            was_current,
        })
    }
}

impl ExamRepository for MemoryStore {
    fn insert_exam(
        &self,
        draft: ExamDraft,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Exam, RepositoryError> {
        let mut tables = self.tables()?;
        let id = tables.allocate_exam_id();
        let exam = Exam::from_draft(id, draft, uploaded_at);
        tables.exams.insert(id, exam.clone());
        Ok(exam)
    }

    fn update_exam(&self, exam: Exam) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        match tables.exams.get_mut(&exam.id) {
            Some(slot) => {
                *slot = exam;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_exam(&self, id: ExamId) -> Result<Option<Exam>, RepositoryError> {
        Ok(self.tables()?.exams.get(&id).cloned())
    }

    fn exams_for_offering(
        &self,
        offering: &CourseOfferingId,
    ) -> Result<Vec<Exam>, RepositoryError> {
        Ok(self
            .tables()?
            .exams
            .values()
            .filter(|exam| &exam.offering == offering)
            .cloned()
            .collect())
    }

    fn delete_exam(&self, id: ExamId) -> Result<Exam, RepositoryError> {
        let mut tables = self.tables()?;
        let exam = tables.exams.remove(&id).ok_or(RepositoryError::NotFound)?;
        tables.flags.retain(|_, flag| flag.exam != id);
        tables.overrides.retain(|(exam_id, _), _| *exam_id != id);
        Ok(exam)
    }

    fn insert_flag(
        &self,
        exam: ExamId,
        reason: String,
        created_at: DateTime<Utc>,
    ) -> Result<FlagInsert, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.exams.contains_key(&exam) {
            return Err(RepositoryError::NotFound);
        }
        let unresolved_before = tables
            .flags
            .values()
            .filter(|flag| flag.exam == exam && !flag.resolved)
            .count();
        let flag = ExamFlag {
            id: tables.allocate_flag_id(),
            exam,
            reason,
            resolved: false,
            created_at,
        };
        tables.flags.insert(flag.id, flag.clone());
        Ok(FlagInsert {
            flag,
            unresolved_before,
            unresolved_after: unresolved_before + 1,
        })
    }

    fn update_flag(&self, flag: ExamFlag) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        match tables.flags.get_mut(&flag.id) {
            Some(slot) => {
                *slot = flag;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_flag(&self, id: FlagId) -> Result<Option<ExamFlag>, RepositoryError> {
        Ok(self.tables()?.flags.get(&id).cloned())
    }

    fn flags_for(&self, exam: ExamId) -> Result<Vec<ExamFlag>, RepositoryError> {
        Ok(self
            .tables()?
            .flags
            .values()
            .filter(|flag| flag.exam == exam)
            .cloned()
            .collect())
    }

    fn put_override(&self, decision: PermissionOverride) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.exams.contains_key(&decision.exam) {
            return Err(RepositoryError::NotFound);
        }
        tables
            .overrides
            .insert((decision.exam, decision.user.clone()), decision);
        Ok(())
    }

    fn remove_override(&self, exam: ExamId, user: &UserId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables()?;
        Ok(tables.overrides.remove(&(exam, user.clone())).is_some())
    }

    fn overrides_for(&self, exam: ExamId) -> Result<Vec<PermissionOverride>, RepositoryError> {
        Ok(self
            .tables()?
            .overrides
            .values()
            .filter(|decision| decision.exam == exam)
            .cloned()
            .collect())
    }
}

/// Publisher that keeps every event for later inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<DomainEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: DomainEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError::Transport("recorder mutex poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}
