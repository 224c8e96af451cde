use crate::calendar::YearMonth;
use crate::progression::CatCurveError;
use crate::OfficeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Address of one office/role/level cohort.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub office: OfficeId,
    pub role: String,
    /// `None` for flat roles.
    pub level: Option<String>,
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.level {
            Some(level) => write!(f, "{}/{}/{}", self.office, self.role, level),
            None => write!(f, "{}/{}", self.office, self.role),
        }
    }
}

/// Fatal configuration problems. Any of these aborts a run before or during
/// the month in which it is detected.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid run range {start}..{end}")]
    InvalidRange { start: YearMonth, end: YearMonth },
    #[error("office {0} is in scope but not configured")]
    UnknownOffice(OfficeId),
    #[error("office {office} references unknown role {role}")]
    UnknownRole { office: OfficeId, role: String },
    #[error("{cell}: cell shape does not match the role definition")]
    ShapeMismatch { cell: CellRef },
    #[error("{cell}: level is not defined for the role")]
    UnknownLevel { cell: CellRef },
    #[error("{cell}: level missing from office configuration")]
    MissingLevel { cell: CellRef },
    #[error("role {role}: duplicate level {level}")]
    DuplicateLevel { role: String, level: String },
    #[error("role {role} level {level}: unknown next_level {next}")]
    UnknownNextLevel {
        role: String,
        level: String,
        next: String,
    },
    #[error("role {role} level {level}: {reason}")]
    InvalidProgression {
        role: String,
        level: String,
        reason: String,
    },
    #[error("role {role} level {level}: malformed CAT curve: {source}")]
    MalformedCatCurve {
        role: String,
        level: String,
        #[source]
        source: CatCurveError,
    },
    #[error("{cell} {month}: missing required field {field}")]
    MissingEntry {
        cell: CellRef,
        month: YearMonth,
        field: &'static str,
    },
    #[error("{cell} {month}: invalid {field}: {reason}")]
    InvalidEntry {
        cell: CellRef,
        month: YearMonth,
        field: &'static str,
        reason: String,
    },
    #[error("invalid run parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
    #[error("global target {role}/{level:?} in {month}: {reason}")]
    InvalidGlobalTarget {
        role: String,
        level: Option<String>,
        month: YearMonth,
        reason: String,
    },
}
