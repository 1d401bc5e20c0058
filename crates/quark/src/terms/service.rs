use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::domain::{Season, Term, TermError, TermKey, TermSystem};
use super::repository::TermRepository;
use crate::events::{DomainEvent, EventError, EventPublisher};
use crate::repository::RepositoryError;

/// Filters for [`TermService::list_terms`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TermListing {
    #[serde(default)]
    pub include_future: bool,
    #[serde(default)]
    pub include_summer: bool,
    #[serde(default)]
    pub reverse: bool,
}

/// Service guarding the term key and current-term invariants.
pub struct TermService<R, P> {
    repository: Arc<R>,
    events: Arc<P>,
    system: TermSystem,
}

impl<R, P> TermService<R, P>
where
    R: TermRepository + 'static,
    P: EventPublisher + 'static,
{
    pub fn new(repository: Arc<R>, events: Arc<P>, system: TermSystem) -> Self {
        Self {
            repository,
            events,
            system,
        }
    }

    pub fn system(&self) -> TermSystem {
        self.system
    }

    /// Validate, key, and persist a term.
    ///
    /// A term that already carries a key must still map onto it: changing season or
    /// year requires clearing or updating `key` explicitly.
    pub fn save(&self, mut term: Term) -> Result<Term, TermServiceError> {
        if term.is_placeholder() {
            debug!("skipping placeholder term");
            return Ok(term);
        }
        if term.year == 0 {
            return Err(TermError::InvalidYear.into());
        }

        let computed = term.computed_key();
        if let Some(stored) = term.key {
            if stored != computed {
                warn!(%stored, %computed, "rejected term save with stale key");
                return Err(TermError::InvariantViolation { stored, computed }.into());
            }
        }
        term.key = Some(computed);

        let outcome = self.repository.save(term)?;

        if outcome.term.current && !outcome.was_current {
            info!(
                key = %computed,
                demoted = outcome.demoted.len(),
                "current term changed"
            );
            let mut event = DomainEvent::new("term.current_changed", computed.to_string())
                .with_detail("name", outcome.term.verbose_name());
            if !outcome.demoted.is_empty() {
                let demoted: Vec<String> =
                    outcome.demoted.iter().map(|key| key.to_string()).collect();
                event = event.with_detail("previous", demoted.join(","));
            }
            self.events.publish(event)?;
        } else {
            debug!(key = %computed, "term saved");
        }

        Ok(outcome.term)
    }

    pub fn current_term(&self) -> Result<Option<Term>, TermServiceError> {
        Ok(self.repository.current()?)
    }

    pub fn get(&self, key: TermKey) -> Result<Term, TermServiceError> {
        let term = self.repository.fetch(key)?.ok_or(RepositoryError::NotFound)?;
        Ok(term)
    }

    /// Natural-key lookup.
    pub fn by_season_year(&self, season: Season, year: u16) -> Result<Term, TermServiceError> {
        self.get(super::domain::compute_key(season, year))
    }

    /// Lookup by the `fa2012` form; malformed names are reported as missing.
    pub fn by_url_name(&self, name: &str) -> Result<Term, TermServiceError> {
        let (season, year) = Term::parse_url_name(name).ok_or(RepositoryError::NotFound)?;
        self.by_season_year(season, year)
    }

    pub fn list_terms(&self, listing: TermListing) -> Result<Vec<Term>, TermServiceError> {
        let mut terms = self.repository.list()?;

        if !listing.include_summer {
            terms.retain(|term| term.season != Season::Summer);
        }
        if self.system == TermSystem::Semester {
            terms.retain(|term| term.season != Season::Winter);
        }
        if !listing.include_future {
            if let Some(current) = self.repository.current()? {
                let limit = current.computed_key();
                terms.retain(|term| term.computed_key() <= limit);
            }
        }

        terms.sort_by_key(Term::computed_key);
        if listing.reverse {
            terms.reverse();
        }
        Ok(terms)
    }
}

/// Error raised by the term service.
#[derive(Debug, thiserror::Error)]
pub enum TermServiceError {
    #[error(transparent)]
    Term(#[from] TermError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Event(#[from] EventError),
}
