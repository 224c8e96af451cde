//! Mutable workforce state: people grouped into office/role/level cohorts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use workforce_core::{
    CellSet, ConfigError, EventKind, OfficeId, PersonId, ResolvedConfig, RoleKind, YearMonth,
};

/// One tracked employee.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub office: OfficeId,
    pub role: String,
    /// `None` in flat roles.
    pub level: Option<String>,
    pub hire_date: YearMonth,
    /// Tenure anchor; reset on promotion. Never before `hire_date`.
    pub level_start: YearMonth,
    pub active: bool,
    pub history: Vec<(YearMonth, EventKind)>,
}

impl Person {
    /// Whole months at the current level as of `now`.
    pub fn tenure_at_level(&self, now: YearMonth) -> u32 {
        u32::try_from(self.level_start.months_until(now)).unwrap_or(0)
    }

    pub fn months_employed(&self, now: YearMonth) -> u32 {
        u32::try_from(self.hire_date.months_until(now)).unwrap_or(0)
    }
}

/// Ordered people of one office/role/level. Its size can never go negative.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub people: Vec<Person>,
}

impl Cohort {
    pub fn count(&self) -> u32 {
        self.people.len() as u32
    }

    /// Remove the people at `indices` (any order, no duplicates) and return
    /// them in cohort order.
    pub fn take(&mut self, indices: &[usize]) -> Vec<Person> {
        let mut marked = vec![false; self.people.len()];
        for &i in indices {
            if let Some(m) = marked.get_mut(i) {
                *m = true;
            }
        }
        let mut taken = Vec::with_capacity(indices.len());
        let mut kept = Vec::with_capacity(self.people.len().saturating_sub(indices.len()));
        for (person, take) in self.people.drain(..).zip(marked) {
            if take {
                taken.push(person);
            } else {
                kept.push(person);
            }
        }
        self.people = kept;
        taken
    }
}

/// Cohorts of one role in an office.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RoleState {
    Flat(Cohort),
    Leveled(BTreeMap<String, Cohort>),
}

impl RoleState {
    pub fn fte(&self) -> u32 {
        match self {
            RoleState::Flat(c) => c.count(),
            RoleState::Leveled(levels) => levels.values().map(Cohort::count).sum(),
        }
    }

    pub fn cohort(&self, level: Option<&str>) -> Option<&Cohort> {
        match (self, level) {
            (RoleState::Flat(c), None) => Some(c),
            (RoleState::Leveled(levels), Some(l)) => levels.get(l),
            _ => None,
        }
    }

    pub fn cohort_mut(&mut self, level: Option<&str>) -> Option<&mut Cohort> {
        match (self, level) {
            (RoleState::Flat(c), None) => Some(c),
            (RoleState::Leveled(levels), Some(l)) => levels.get_mut(l),
            _ => None,
        }
    }
}

/// Workforce of one office.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfficeState {
    pub id: OfficeId,
    pub roles: BTreeMap<String, RoleState>,
    /// People who churned, kept inactive with their history.
    pub departed: Vec<Person>,
    next_person: u64,
}

impl OfficeState {
    /// Build the starting population from configuration.
    ///
    /// Each starting person has been at their level (and employed) for the
    /// cell's `initial_tenure_months` as of `start`.
    pub fn from_config(
        cfg: &ResolvedConfig,
        id: &OfficeId,
        start: YearMonth,
    ) -> Result<Self, ConfigError> {
        let oc = cfg
            .offices
            .get(id)
            .ok_or_else(|| ConfigError::UnknownOffice(id.clone()))?;
        let mut office = OfficeState {
            id: id.clone(),
            roles: BTreeMap::new(),
            departed: Vec::new(),
            next_person: 0,
        };
        // Shape and level coverage are checked by office_cells.
        let cells = cfg.office_cells(id)?;
        for (role, set) in &oc.roles {
            let state = match (cfg.roles.get(role).map(|r| &r.kind), set) {
                (Some(RoleKind::Leveled { .. }), CellSet::Leveled(_)) => {
                    RoleState::Leveled(BTreeMap::new())
                }
                _ => RoleState::Flat(Cohort::default()),
            };
            office.roles.insert(role.clone(), state);
        }
        for spec in cells {
            let anchor = spec.hire_anchor(start)?;
            let mut cohort = Cohort::default();
            for _ in 0..spec.config.fte {
                let person = office.new_person(&spec.cell.role, spec.cell.level.clone(), anchor);
                cohort.people.push(person);
            }
            match office.roles.get_mut(&spec.cell.role) {
                Some(RoleState::Leveled(levels)) => {
                    if let Some(level) = spec.cell.level.clone() {
                        levels.insert(level, cohort);
                    }
                }
                Some(RoleState::Flat(c)) => *c = cohort,
                None => {}
            }
        }
        Ok(office)
    }

    /// Allocate a person; the caller places them in a cohort.
    pub fn new_person(&mut self, role: &str, level: Option<String>, hired: YearMonth) -> Person {
        let id = PersonId(self.next_person);
        self.next_person += 1;
        Person {
            id,
            office: self.id.clone(),
            role: role.to_string(),
            level,
            hire_date: hired,
            level_start: hired,
            active: true,
            history: Vec::new(),
        }
    }

    pub fn total_fte(&self) -> u32 {
        self.roles.values().map(RoleState::fte).sum()
    }

    /// Headcount of one cell; zero if the office does not carry it.
    pub fn cell_fte(&self, role: &str, level: Option<&str>) -> u32 {
        self.cohort(role, level).map_or(0, Cohort::count)
    }

    pub fn has_cell(&self, role: &str, level: Option<&str>) -> bool {
        self.cohort(role, level).is_some()
    }

    pub fn cohort(&self, role: &str, level: Option<&str>) -> Option<&Cohort> {
        self.roles.get(role).and_then(|r| r.cohort(level))
    }

    pub fn cohort_mut(&mut self, role: &str, level: Option<&str>) -> Option<&mut Cohort> {
        self.roles.get_mut(role).and_then(|r| r.cohort_mut(level))
    }
}
