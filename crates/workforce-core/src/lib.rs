#![deny(warnings)]

//! Core domain model for the headcount planner.
//!
//! This crate holds the serializable types shared by the engine, the
//! resolved run configuration with its validation, and the pure building
//! blocks of the monthly workforce model:
//! - largest-remainder apportionment of firm-wide targets ([`apportion`])
//! - rate-vs-absolute resolution of recruitment and churn ([`rates`])
//! - tenure-gated promotion probabilities from CAT curves ([`progression`])

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod apportion;
pub mod calendar;
pub mod config;
pub mod demo;
pub mod error;
pub mod event;
pub mod progression;
pub mod rates;

pub use apportion::{apportion, Apportionment, ApportionError};
pub use calendar::{CalendarError, YearMonth};
pub use config::{
    validate_config, CellConfig, CellSet, CellSpec, GlobalTarget, LevelConfig, OfficeConfig,
    ResolvedConfig, RoleConfig, RoleKind, RunParams,
};
pub use error::{CellRef, ConfigError};
pub use event::{Anomaly, AnomalyKind, Event, EventKind, PersonId};
pub use progression::{CatBucket, CatCurve, CatCurveError, ProgressionModel, ProgressionRule};
pub use rates::{
    resolve_count, CellRates, MonthlyRates, MonthlyTable, Movement, RateError, MAX_MOVEMENT,
};

/// Office identifier, e.g. "Stockholm".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfficeId(pub String);

impl fmt::Display for OfficeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OfficeId {
    fn from(s: &str) -> Self {
        OfficeId(s.to_string())
    }
}
