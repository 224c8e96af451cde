//! Monthly transition of one office: recruitment, then churn, then progression.

use crate::state::{OfficeState, Person, RoleState};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use workforce_core::{
    Anomaly, AnomalyKind, CellRates, CellRef, CellSpec, ConfigError, Event, EventKind, Movement,
    ProgressionModel, ResolvedConfig, YearMonth,
};

/// Role/level of a cell within an office.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub role: String,
    pub level: Option<String>,
}

impl CellKey {
    pub fn new(role: &str, level: Option<&str>) -> Self {
        Self {
            role: role.to_string(),
            level: level.map(str::to_string),
        }
    }
}

/// Absolute values apportioned from firm-wide targets; they replace the
/// cell's own recruitment/churn inputs for the month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellOverride {
    pub recruitment: Option<u32>,
    pub churn: Option<u32>,
}

pub type Overrides = BTreeMap<CellKey, CellOverride>;

/// Movement counts of one cell for one month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCounts {
    pub fte_start: u32,
    pub recruited: u32,
    pub churned: u32,
    pub promoted_in: u32,
    pub promoted_out: u32,
    pub fte_end: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CellOutcome {
    pub key: CellKey,
    pub billable: bool,
    /// Inputs actually used, after overrides.
    pub rates: CellRates,
    pub counts: CellCounts,
}

/// Everything one office produced in one month.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OfficeTransition {
    pub cells: Vec<CellOutcome>,
    pub events: Vec<Event>,
    pub anomalies: Vec<Anomaly>,
}

/// Advance one office by one month.
///
/// Recruitment and churn run for every cell first; progression then works
/// on the post-churn cohorts, so a person promoted this month is never
/// churned or re-evaluated at the destination level in the same month.
pub fn advance_office<R: Rng + ?Sized>(
    office: &mut OfficeState,
    cfg: &ResolvedConfig,
    model: &ProgressionModel,
    month: YearMonth,
    overrides: &Overrides,
    rng: &mut R,
) -> Result<OfficeTransition, ConfigError> {
    let mut out = OfficeTransition::default();
    let mut positions = BTreeMap::new();
    for spec in cfg.office_cells(&office.id)? {
        let key = CellKey {
            role: spec.cell.role.clone(),
            level: spec.cell.level.clone(),
        };
        let mut rates = spec.rates(month)?;
        let o = overrides.get(&key).copied().unwrap_or_default();
        if let Some(n) = o.recruitment {
            rates.recruitment = Movement::Absolute(f64::from(n));
        }
        if let Some(n) = o.churn {
            rates.churn = Movement::Absolute(f64::from(n));
        }
        let counts = recruit_and_churn(office, &spec, &rates, month, rng, &mut out)?;
        positions.insert(key.clone(), out.cells.len());
        out.cells.push(CellOutcome {
            key,
            billable: spec.billable,
            rates,
            counts,
        });
    }

    progress(office, model, month, rng, &mut out, &positions)?;

    for cell in &mut out.cells {
        cell.counts.fte_end = office.cell_fte(&cell.key.role, cell.key.level.as_deref());
    }
    debug!(
        office = %office.id,
        %month,
        events = out.events.len(),
        fte = office.total_fte(),
        "office advanced"
    );
    Ok(out)
}

fn missing_cell(spec: &CellSpec<'_>) -> ConfigError {
    ConfigError::MissingLevel {
        cell: spec.cell.clone(),
    }
}

fn recruit_and_churn<R: Rng + ?Sized>(
    office: &mut OfficeState,
    spec: &CellSpec<'_>,
    rates: &CellRates,
    month: YearMonth,
    rng: &mut R,
    out: &mut OfficeTransition,
) -> Result<CellCounts, ConfigError> {
    let role = spec.cell.role.as_str();
    let level = spec.cell.level.as_deref();
    let invalid = |field, reason: String| ConfigError::InvalidEntry {
        cell: spec.cell.clone(),
        month,
        field,
        reason,
    };
    let fte_start = office.cell_fte(role, level);

    let recruited = rates
        .recruitment
        .resolve(fte_start)
        .map_err(|e| invalid("recruitment", e.to_string()))?;
    let mut hires = Vec::with_capacity(recruited as usize);
    for _ in 0..recruited {
        let mut person = office.new_person(role, spec.cell.level.clone(), month);
        person.history.push((month, EventKind::Hired));
        out.events.push(event(&spec.cell, month, None, level, EventKind::Hired, &person));
        hires.push(person);
    }

    let cohort = office
        .cohort_mut(role, level)
        .ok_or_else(|| missing_cell(spec))?;
    cohort.people.extend(hires);
    let available = cohort.count();
    let requested = rates
        .churn
        .resolve(available)
        .map_err(|e| invalid("churn", e.to_string()))?;
    let churned = requested.min(available);
    if requested > available {
        warn!(cell = %spec.cell, %month, requested, available, "churn clamped to headcount");
        out.anomalies.push(Anomaly {
            month,
            office: Some(spec.cell.office.clone()),
            role: role.to_string(),
            level: spec.cell.level.clone(),
            kind: AnomalyKind::ChurnClamped {
                requested,
                available,
            },
        });
    }
    let victims = choose_leavers(fte_start as usize, available as usize, churned as usize, rng);
    let leavers = cohort.take(&victims);
    for mut person in leavers {
        person.active = false;
        person.history.push((month, EventKind::Churned));
        out.events.push(event(&spec.cell, month, level, None, EventKind::Churned, &person));
        office.departed.push(person);
    }

    Ok(CellCounts {
        fte_start,
        recruited,
        churned,
        ..Default::default()
    })
}

/// Indices of the people who leave.
///
/// The first `existing` people of the cohort predate this month's hires.
/// Leavers are drawn uniformly from them; hires only go, newest first,
/// once the existing people are exhausted.
fn choose_leavers<R: Rng + ?Sized>(
    existing: usize,
    total: usize,
    n: usize,
    rng: &mut R,
) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    if n <= existing {
        return rand::seq::index::sample(rng, existing, n).into_vec();
    }
    let from_hires = (n - existing).min(total - existing);
    (0..existing).chain(total - from_hires..total).collect()
}

struct Promotion {
    role: String,
    from: String,
    to: String,
    indices: Vec<usize>,
}

fn progress<R: Rng + ?Sized>(
    office: &mut OfficeState,
    model: &ProgressionModel,
    month: YearMonth,
    rng: &mut R,
    out: &mut OfficeTransition,
    positions: &BTreeMap<CellKey, usize>,
) -> Result<(), ConfigError> {
    // Draw for every level against the post-churn snapshot before moving anyone.
    let mut promotions = Vec::new();
    for (role, state) in &office.roles {
        let RoleState::Leveled(levels) = state else {
            continue;
        };
        for level in model.levels(role) {
            let (Some(rule), Some(cohort)) = (model.rule(role, level), levels.get(level)) else {
                continue;
            };
            let Some(next) = &rule.next_level else {
                continue;
            };
            let mut indices = Vec::new();
            for (i, person) in cohort.people.iter().enumerate() {
                if rule.draw(rng, month, person.tenure_at_level(month)) {
                    indices.push(i);
                }
            }
            if !indices.is_empty() {
                promotions.push(Promotion {
                    role: role.clone(),
                    from: level.clone(),
                    to: next.clone(),
                    indices,
                });
            }
        }
    }

    for p in promotions {
        let cell = CellRef {
            office: office.id.clone(),
            role: p.role.clone(),
            level: Some(p.to.clone()),
        };
        if !office.has_cell(&p.role, Some(p.to.as_str())) {
            return Err(ConfigError::MissingLevel { cell });
        }
        let movers = office
            .cohort_mut(&p.role, Some(p.from.as_str()))
            .map(|c| c.take(&p.indices))
            .unwrap_or_default();
        let moved = movers.len() as u32;
        let mut arrived = Vec::with_capacity(movers.len());
        for mut person in movers {
            person.level = Some(p.to.clone());
            person.level_start = month;
            person.history.push((month, EventKind::Promoted));
            out.events.push(event(
                &cell,
                month,
                Some(p.from.as_str()),
                Some(p.to.as_str()),
                EventKind::Promoted,
                &person,
            ));
            arrived.push(person);
        }
        if let Some(dest) = office.cohort_mut(&p.role, Some(p.to.as_str())) {
            dest.people.extend(arrived);
        }
        if let Some(&i) = positions.get(&CellKey::new(&p.role, Some(p.from.as_str()))) {
            out.cells[i].counts.promoted_out += moved;
        }
        if let Some(&i) = positions.get(&CellKey::new(&p.role, Some(p.to.as_str()))) {
            out.cells[i].counts.promoted_in += moved;
        }
    }
    Ok(())
}

fn event(
    cell: &CellRef,
    month: YearMonth,
    from: Option<&str>,
    to: Option<&str>,
    kind: EventKind,
    person: &Person,
) -> Event {
    Event {
        date: month,
        office: cell.office.clone(),
        role: cell.role.clone(),
        from_level: from.map(str::to_string),
        to_level: to.map(str::to_string),
        kind,
        person: person.id,
    }
}
