//! Append-only workforce events and recovered anomalies.

use crate::calendar::YearMonth;
use crate::OfficeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-office sequence number; unique together with the office id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Hired,
    Churned,
    Promoted,
}

/// One workforce movement. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub date: YearMonth,
    pub office: OfficeId,
    pub role: String,
    pub from_level: Option<String>,
    pub to_level: Option<String>,
    #[serde(rename = "event_type")]
    pub kind: EventKind,
    pub person: PersonId,
}

/// Recovered conditions: the run continues, the anomaly is reported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Churn target exceeded the available headcount and was clamped.
    ChurnClamped { requested: u32, available: u32 },
    /// Apportionment remainder units with no eligible office.
    ApportionmentDropped { units: u32 },
    /// Global target could not be distributed because every weight was zero.
    ZeroApportionmentWeight { target: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub month: YearMonth,
    /// `None` for firm-wide anomalies (apportionment).
    pub office: Option<OfficeId>,
    pub role: String,
    pub level: Option<String>,
    pub kind: AnomalyKind,
}
