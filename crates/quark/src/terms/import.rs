//! Bulk term loading from CSV dumps (`term,year,current`).
//!
//! Rows go through [`TermService::save`], so imports obey the same key and
//! current-term rules as interactive writes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::info;

use super::domain::{Season, Term, TermError};
use super::repository::TermRepository;
use super::service::{TermService, TermServiceError};
use crate::events::EventPublisher;

#[derive(Debug, Deserialize)]
struct TermRow {
    term: String,
    year: u16,
    #[serde(default, deserialize_with = "lenient_bool")]
    current: bool,
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "n" => Ok(false),
        "1" | "true" | "yes" | "y" => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "unrecognized boolean '{other}'"
        ))),
    }
}

/// Parses a dump into unsaved terms, preserving file order.
pub fn parse_terms<R: Read>(reader: R) -> Result<Vec<Term>, TermImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut terms = Vec::new();

    for (index, record) in csv_reader.deserialize::<TermRow>().enumerate() {
        let row = record?;
        // header is line 1
        let line = index + 2;
        let season =
            Season::from_code(&row.term).map_err(|source| TermImportError::Row { line, source })?;
        // `un,0` is the placeholder row; any other season needs a real year
        if row.year == 0 && season != Season::Unknown {
            return Err(TermImportError::Row {
                line,
                source: TermError::InvalidYear,
            });
        }
        terms.push(Term {
            season,
            year: row.year,
            current: row.current,
            key: None,
        });
    }

    Ok(terms)
}

/// Totals from an import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermImportSummary {
    pub imported: usize,
    pub skipped_placeholders: usize,
    pub current: Option<Term>,
}

pub struct TermImporter;

impl TermImporter {
    pub fn from_path<P, R, E>(
        path: P,
        service: &TermService<R, E>,
    ) -> Result<TermImportSummary, TermImportError>
    where
        P: AsRef<Path>,
        R: TermRepository + 'static,
        E: EventPublisher + 'static,
    {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file, service)
    }

    pub fn from_reader<Rd, R, E>(
        reader: Rd,
        service: &TermService<R, E>,
    ) -> Result<TermImportSummary, TermImportError>
    where
        Rd: Read,
        R: TermRepository + 'static,
        E: EventPublisher + 'static,
    {
        let terms = parse_terms(reader)?;
        let mut imported = 0;
        let mut skipped_placeholders = 0;

        for term in terms {
            if term.is_placeholder() {
                skipped_placeholders += 1;
                continue;
            }
            service.save(term)?;
            imported += 1;
        }

        let current = service.current_term()?;
        info!(imported, skipped_placeholders, "term import finished");

        Ok(TermImportSummary {
            imported,
            skipped_placeholders,
            current,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TermImportError {
    #[error("failed to read term dump: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse term dump: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: TermError,
    },
    #[error(transparent)]
    Service(#[from] TermServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStore, RecordingPublisher};
    use crate::terms::{TermKey, TermSystem};
    use std::io::Cursor;
    use std::sync::Arc;

    const DUMP: &str = "term,year,current\n\
        fa,2012,\n\
        wi,2013,no\n\
        sp,2013,yes\n\
        un,0,\n";

    fn service() -> TermService<MemoryStore, RecordingPublisher> {
        TermService::new(
            Arc::new(MemoryStore::default()),
            Arc::new(RecordingPublisher::default()),
            TermSystem::Quarter,
        )
    }

    #[test]
    fn parse_reads_rows_in_order() {
        let terms = parse_terms(Cursor::new(DUMP)).expect("parses");
        let names: Vec<_> = terms.iter().map(Term::url_name).collect();
        assert_eq!(names, vec!["fa2012", "wi2013", "sp2013", "un0"]);
        assert!(terms[2].current);
        assert!(!terms[1].current);
    }

    #[test]
    fn import_saves_through_the_service() {
        let service = service();
        let summary =
            TermImporter::from_reader(Cursor::new(DUMP), &service).expect("imports");

        assert_eq!(summary.imported, 3);
        assert_eq!(summary.skipped_placeholders, 1);
        let current = summary.current.expect("current term set");
        assert_eq!(current.key, Some(TermKey(20132)));
    }

    #[test]
    fn later_current_rows_win() {
        let service = service();
        let dump = "term,year,current\nfa,2012,true\nsp,2013,true\n";
        let summary = TermImporter::from_reader(Cursor::new(dump), &service).expect("imports");
        assert_eq!(
            summary.current.map(|term| term.url_name()).as_deref(),
            Some("sp2013")
        );
    }

    #[test]
    fn unknown_season_codes_report_their_line() {
        let dump = "term,year,current\nfa,2012,\nau,2013,\n";
        match parse_terms(Cursor::new(dump)) {
            Err(TermImportError::Row { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(source, TermError::InvalidSeason("au".to_string()));
            }
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn zero_years_report_their_line() {
        let service = service();
        let dump = "term,year,current\nfa,2012,\nun,0,\nfa,0,\n";
        match TermImporter::from_reader(Cursor::new(dump), &service) {
            Err(TermImportError::Row { line, source }) => {
                assert_eq!(line, 4);
                assert_eq!(source, TermError::InvalidYear);
            }
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_booleans_are_csv_errors() {
        let dump = "term,year,current\nfa,2012,maybe\n";
        assert!(matches!(
            parse_terms(Cursor::new(dump)),
            Err(TermImportError::Csv(_))
        ));
    }
}
