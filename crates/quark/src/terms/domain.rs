use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

/// Academic season; the wire form is the two-letter code used in URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "un")]
    Unknown,
    #[serde(rename = "wi")]
    Winter,
    #[serde(rename = "sp")]
    Spring,
    #[serde(rename = "su")]
    Summer,
    #[serde(rename = "fa")]
    Fall,
}

impl Season {
    pub const ALL: [Season; 5] = [
        Season::Unknown,
        Season::Winter,
        Season::Spring,
        Season::Summer,
        Season::Fall,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Season::Unknown => "un",
            Season::Winter => "wi",
            Season::Spring => "sp",
            Season::Summer => "su",
            Season::Fall => "fa",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Unknown => "Unknown",
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }

    /// Position within a calendar year; the last digit of a [`TermKey`].
    pub fn rank(self) -> u32 {
        match self {
            Season::Unknown => 0,
            Season::Winter => 1,
            Season::Spring => 2,
            Season::Summer => 3,
            Season::Fall => 4,
        }
    }

    pub fn from_rank(rank: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|season| season.rank() == rank)
    }

    pub fn from_code(code: &str) -> Result<Self, TermError> {
        let normalized = code.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|season| season.code() == normalized)
            .ok_or_else(|| TermError::InvalidSeason(code.to_string()))
    }
}

/// Sortable identity of a term: `year * 10 + season rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermKey(pub u32);

impl TermKey {
    pub fn year(self) -> u32 {
        self.0 / 10
    }

    pub fn season(self) -> Option<Season> {
        Season::from_rank(self.0 % 10)
    }

    /// URL form (`fa2012`) for keys that map back onto a known season.
    pub fn url_name(self) -> Option<String> {
        self.season()
            .map(|season| format!("{}{}", season.code(), self.year()))
    }
}

impl fmt::Display for TermKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn compute_key(season: Season, year: u16) -> TermKey {
    TermKey(u32::from(year) * 10 + season.rank())
}

/// Key derivation for untyped input such as form fields or CSV cells.
pub fn compute_key_from_code(code: &str, year: u16) -> Result<TermKey, TermError> {
    Season::from_code(code).map(|season| compute_key(season, year))
}

/// Whether the school runs quarters or semesters; semesters have no winter term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermSystem {
    #[default]
    Quarter,
    Semester,
}

impl TermSystem {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quarter" => Some(Self::Quarter),
            "semester" => Some(Self::Semester),
            _ => None,
        }
    }
}

/// An academic period. `key` stays `None` until the term has been saved once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub season: Season,
    pub year: u16,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<TermKey>,
}

impl Term {
    pub fn new(season: Season, year: u16) -> Self {
        Self {
            season,
            year,
            current: false,
            key: None,
        }
    }

    pub fn as_current(mut self) -> Self {
        self.current = true;
        self
    }

    /// The `(unknown, 0)` sentinel used by legacy dumps for "no term".
    pub fn is_placeholder(&self) -> bool {
        self.season == Season::Unknown && self.year == 0
    }

    pub fn computed_key(&self) -> TermKey {
        compute_key(self.season, self.year)
    }

    /// `Fall 2012`
    pub fn verbose_name(&self) -> String {
        format!("{} {}", self.season.label(), self.year)
    }

    pub fn display_name(&self) -> String {
        let name = self.verbose_name();
        if self.current {
            format!("{name} (Current)")
        } else {
            name
        }
    }

    /// `fa2012`
    pub fn url_name(&self) -> String {
        format!("{}{}", self.season.code(), self.year)
    }

    /// Inverse of [`Term::url_name`]; `None` for anything malformed.
    pub fn parse_url_name(name: &str) -> Option<(Season, u16)> {
        let code = name.get(0..2)?;
        let year = name.get(2..)?.parse::<u16>().ok()?;
        let season = Season::from_code(code).ok()?;
        Some((season, year))
    }

    /// Orders by `(year, season rank)`.
    ///
    /// A missing counterpart stands in for "now": the current calendar year with an
    /// unknown season.
    pub fn compare(&self, other: Option<&Term>) -> Ordering {
        self.compare_with_fallback_year(other, Local::now().year())
    }

    pub fn compare_with_fallback_year(&self, other: Option<&Term>, fallback_year: i32) -> Ordering {
        let (other_year, other_rank) = match other {
            Some(term) => (i64::from(term.year), term.season.rank()),
            None => (i64::from(fallback_year), Season::Unknown.rank()),
        };
        (i64::from(self.year), self.season.rank()).cmp(&(other_year, other_rank))
    }
}

/// Validation failures raised by term operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TermError {
    #[error("invalid season code '{0}'")]
    InvalidSeason(String),
    #[error("term year must be a positive integer")]
    InvalidYear,
    #[error(
        "term {stored} cannot change season or year without also updating its key (expected {computed})"
    )]
    InvariantViolation { stored: TermKey, computed: TermKey },
}
