//! Monthly, yearly and whole-run result structures.
//!
//! Results are built once per period and never mutated afterwards.

use crate::transition::CellCounts;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use workforce_core::{Anomaly, Event, EventKind, OfficeId, YearMonth};
use workforce_econ::{FinancialSummary, OfficeFinancials};

/// One cell's movements and escalated rates for one month.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub month: YearMonth,
    pub fte_start: u32,
    pub recruited: u32,
    pub churned: u32,
    pub promoted_in: u32,
    pub promoted_out: u32,
    pub fte_end: u32,
    /// Hourly price after escalation.
    pub price: Decimal,
    /// Monthly salary after escalation.
    pub salary: Decimal,
}

impl CellRecord {
    pub fn new(month: YearMonth, counts: &CellCounts, price: Decimal, salary: Decimal) -> Self {
        Self {
            month,
            fte_start: counts.fte_start,
            recruited: counts.recruited,
            churned: counts.churned,
            promoted_in: counts.promoted_in,
            promoted_out: counts.promoted_out,
            fte_end: counts.fte_end,
            price,
            salary,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleSnapshot {
    Flat(CellRecord),
    Leveled(BTreeMap<String, CellRecord>),
}

impl RoleSnapshot {
    pub fn fte(&self) -> u32 {
        match self {
            RoleSnapshot::Flat(r) => r.fte_end,
            RoleSnapshot::Leveled(levels) => levels.values().map(|r| r.fte_end).sum(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfficeMonth {
    pub roles: BTreeMap<String, RoleSnapshot>,
    pub financial: OfficeFinancials,
    pub total_fte: u32,
}

impl OfficeMonth {
    /// Record of one cell, if the office carries it.
    pub fn cell(&self, role: &str, level: Option<&str>) -> Option<&CellRecord> {
        match (self.roles.get(role)?, level) {
            (RoleSnapshot::Flat(r), None) => Some(r),
            (RoleSnapshot::Leveled(levels), Some(l)) => levels.get(l),
            _ => None,
        }
    }
}

/// Snapshot of every in-scope office after one month.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyResult {
    pub month: YearMonth,
    pub offices: BTreeMap<OfficeId, OfficeMonth>,
    /// Ordered by office, then cell, then recruitment, churn, progression.
    pub events: Vec<Event>,
    pub anomalies: Vec<Anomaly>,
}

impl MonthlyResult {
    pub fn total_fte(&self) -> u32 {
        self.offices.values().map(|o| o.total_fte).sum()
    }
}

/// Monthly records of one role across a year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRecords {
    Flat(Vec<CellRecord>),
    Leveled(BTreeMap<String, Vec<CellRecord>>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfficeYear {
    pub levels: BTreeMap<String, RoleRecords>,
    pub financial: FinancialSummary,
    /// Headcount at the end of the last month of the period.
    pub total_fte: u32,
    pub average_fte: f64,
}

impl OfficeYear {
    fn empty() -> Self {
        Self {
            levels: BTreeMap::new(),
            financial: FinancialSummary::default(),
            total_fte: 0,
            average_fte: 0.0,
        }
    }

    fn push(&mut self, om: &OfficeMonth) {
        for (role, snapshot) in &om.roles {
            match snapshot {
                RoleSnapshot::Flat(r) => {
                    let entry = self
                        .levels
                        .entry(role.clone())
                        .or_insert_with(|| RoleRecords::Flat(Vec::new()));
                    if let RoleRecords::Flat(records) = entry {
                        records.push(r.clone());
                    }
                }
                RoleSnapshot::Leveled(levels) => {
                    let entry = self
                        .levels
                        .entry(role.clone())
                        .or_insert_with(|| RoleRecords::Leveled(BTreeMap::new()));
                    if let RoleRecords::Leveled(map) = entry {
                        for (level, r) in levels {
                            map.entry(level.clone()).or_default().push(r.clone());
                        }
                    }
                }
            }
        }
        self.total_fte = om.total_fte;
    }
}

/// Aggregate of the (up to twelve) simulated months of one calendar year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YearlyResult {
    pub year: i32,
    pub months: Vec<YearMonth>,
    pub offices: BTreeMap<OfficeId, OfficeYear>,
}

impl YearlyResult {
    /// Build from the chronologically ordered months of `year`; other
    /// years in `months` are ignored.
    pub fn from_months(year: i32, months: &[MonthlyResult]) -> Self {
        let in_year: Vec<&MonthlyResult> =
            months.iter().filter(|m| m.month.year() == year).collect();
        let mut offices: BTreeMap<OfficeId, OfficeYear> = BTreeMap::new();
        for m in &in_year {
            for (id, om) in &m.offices {
                offices.entry(id.clone()).or_insert_with(OfficeYear::empty).push(om);
            }
        }
        for (id, oy) in offices.iter_mut() {
            let per_month: Vec<&OfficeMonth> =
                in_year.iter().filter_map(|m| m.offices.get(id)).collect();
            oy.financial = FinancialSummary::from_months(per_month.iter().map(|om| &om.financial));
            if !per_month.is_empty() {
                let sum: u32 = per_month.iter().map(|om| om.total_fte).sum();
                oy.average_fte = f64::from(sum) / per_month.len() as f64;
            }
        }
        Self {
            year,
            months: in_year.iter().map(|m| m.month).collect(),
            offices,
        }
    }

    /// Firm-wide money totals for the year.
    pub fn firm_financials(&self) -> FinancialSummary {
        self.offices
            .values()
            .fold(FinancialSummary::default(), |acc, o| acc.merge(&o.financial))
    }

    pub fn firm_total_fte(&self) -> u32 {
        self.offices.values().map(|o| o.total_fte).sum()
    }
}

/// Everything a run produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub months: Vec<MonthlyResult>,
    pub years: BTreeMap<i32, YearlyResult>,
    /// Flat chronological event log.
    pub events: Vec<Event>,
    pub anomalies: Vec<Anomaly>,
}

impl SimulationResult {
    pub fn from_months(months: Vec<MonthlyResult>) -> Self {
        let mut years = BTreeMap::new();
        for m in &months {
            let year = m.month.year();
            if !years.contains_key(&year) {
                years.insert(year, YearlyResult::from_months(year, &months));
            }
        }
        let events = months.iter().flat_map(|m| m.events.iter().cloned()).collect();
        let anomalies = months.iter().flat_map(|m| m.anomalies.iter().cloned()).collect();
        Self {
            months,
            years,
            events,
            anomalies,
        }
    }

    pub fn month(&self, month: YearMonth) -> Option<&MonthlyResult> {
        self.months.iter().find(|m| m.month == month)
    }

    /// Firm headcount at the end of `month`.
    pub fn firm_total_fte(&self, month: YearMonth) -> Option<u32> {
        self.month(month).map(MonthlyResult::total_fte)
    }

    pub fn firm_financials(&self, year: i32) -> Option<FinancialSummary> {
        self.years.get(&year).map(YearlyResult::firm_financials)
    }

    pub fn event_counts(&self) -> BTreeMap<EventKind, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.events {
            *counts.entry(e.kind).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workforce_core::PersonId;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn month(m: YearMonth, fte: u32, revenue: i64) -> MonthlyResult {
        let counts = CellCounts {
            fte_start: fte,
            fte_end: fte,
            ..Default::default()
        };
        let record = CellRecord::new(m, &counts, Decimal::new(1000, 0), Decimal::new(50_000, 0));
        let mut levels = BTreeMap::new();
        levels.insert("A".to_string(), record);
        let mut roles = BTreeMap::new();
        roles.insert("Consultant".to_string(), RoleSnapshot::Leveled(levels));
        let financial = OfficeFinancials {
            revenue: Decimal::new(revenue, 0),
            ebitda: Decimal::new(revenue / 4, 0),
            total_fte: fte,
            ..Default::default()
        };
        let mut offices = BTreeMap::new();
        offices.insert(
            OfficeId::from("Oslo"),
            OfficeMonth {
                roles,
                financial,
                total_fte: fte,
            },
        );
        MonthlyResult {
            month: m,
            offices,
            events: vec![Event {
                date: m,
                office: OfficeId::from("Oslo"),
                role: "Consultant".into(),
                from_level: None,
                to_level: Some("A".into()),
                kind: EventKind::Hired,
                person: PersonId(u64::from(fte)),
            }],
            anomalies: vec![],
        }
    }

    #[test]
    fn years_split_at_calendar_boundary() {
        let months = vec![
            month(ym(2025, 11), 10, 100),
            month(ym(2025, 12), 12, 100),
            month(ym(2026, 1), 14, 200),
        ];
        let result = SimulationResult::from_months(months);
        assert_eq!(result.years.len(), 2);
        let y25 = &result.years[&2025];
        assert_eq!(y25.months, vec![ym(2025, 11), ym(2025, 12)]);
        let oslo = &y25.offices[&OfficeId::from("Oslo")];
        assert_eq!(oslo.total_fte, 12);
        assert_eq!(oslo.average_fte, 11.0);
        assert_eq!(oslo.financial.revenue, Decimal::new(200, 0));
        assert_eq!(oslo.financial.months, 2);
        match &oslo.levels["Consultant"] {
            RoleRecords::Leveled(map) => assert_eq!(map["A"].len(), 2),
            RoleRecords::Flat(_) => panic!("Consultant is leveled"),
        }
        assert_eq!(result.firm_total_fte(ym(2026, 1)), Some(14));
        assert_eq!(result.firm_total_fte(ym(2027, 1)), None);
        assert_eq!(result.event_counts()[&EventKind::Hired], 3);
        assert_eq!(
            result.firm_financials(2026).map(|f| f.revenue),
            Some(Decimal::new(200, 0))
        );
    }

    #[test]
    fn cell_lookup_respects_shape() {
        let m = month(ym(2025, 1), 5, 0);
        let oslo = &m.offices[&OfficeId::from("Oslo")];
        assert_eq!(oslo.cell("Consultant", Some("A")).map(|r| r.fte_end), Some(5));
        assert!(oslo.cell("Consultant", None).is_none());
        assert_eq!(oslo.roles["Consultant"].fte(), 5);
    }
}
