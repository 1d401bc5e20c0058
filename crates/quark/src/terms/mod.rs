//! Academic terms: key derivation, ordering, and the single-current-term rule.

pub mod domain;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    compute_key, compute_key_from_code, Season, Term, TermError, TermKey, TermSystem,
};
pub use import::{parse_terms, TermImportError, TermImportSummary, TermImporter};
pub use repository::{TermRepository, TermSaveOutcome, TermView};
pub use router::{term_router, TermPayload};
pub use service::{TermListing, TermService, TermServiceError};
