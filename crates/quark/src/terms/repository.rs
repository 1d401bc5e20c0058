use serde::Serialize;

use super::domain::{Term, TermKey};
use crate::repository::RepositoryError;

/// Result of persisting a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSaveOutcome {
    pub term: Term,
    /// Keys whose current flag was cleared by this save.
    pub demoted: Vec<TermKey>,
    /// Whether the stored row already carried the current flag before the save.
    pub was_current: bool,
}

/// Storage abstraction for academic terms.
pub trait TermRepository: Send + Sync {
    fn fetch(&self, key: TermKey) -> Result<Option<Term>, RepositoryError>;
    /// All stored terms, ascending by key.
    fn list(&self) -> Result<Vec<Term>, RepositoryError>;
    fn current(&self) -> Result<Option<Term>, RepositoryError>;
    /// Upserts `term` under its key. When `term.current` is set, every other stored
    /// term loses its current flag inside the same atomic unit.
    fn save(&self, term: Term) -> Result<TermSaveOutcome, RepositoryError>;
}

/// JSON shape returned by the term endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermView {
    pub key: TermKey,
    pub term: &'static str,
    pub year: u16,
    pub current: bool,
    pub name: String,
    pub url_name: String,
}

impl From<&Term> for TermView {
    fn from(term: &Term) -> Self {
        Self {
            key: term.key.unwrap_or_else(|| term.computed_key()),
            term: term.season.code(),
            year: term.year,
            current: term.current,
            name: term.display_name(),
            url_name: term.url_name(),
        }
    }
}
