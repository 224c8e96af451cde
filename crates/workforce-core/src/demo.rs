//! A small sample firm used by the CLI, benchmarks and tests.

use crate::calendar::YearMonth;
use crate::config::{
    CellConfig, CellSet, LevelConfig, OfficeConfig, ResolvedConfig, RoleConfig, RoleKind,
    RunParams,
};
use crate::rates::{MonthlyRates, MonthlyTable};
use crate::OfficeId;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

struct DemoLevel {
    name: &'static str,
    next: Option<&'static str>,
    months: &'static [u32],
    min_tenure: u32,
    base_rate: f64,
    fte: u32,
    hourly_price: i64,
    salary: i64,
}

const CONSULTANT_LEVELS: [DemoLevel; 6] = [
    DemoLevel {
        name: "A",
        next: Some("AC"),
        months: &[1, 4, 7, 10],
        min_tenure: 6,
        base_rate: 0.15,
        fte: 20,
        hourly_price: 1100,
        salary: 42_000,
    },
    DemoLevel {
        name: "AC",
        next: Some("C"),
        months: &[1, 4, 7, 10],
        min_tenure: 9,
        base_rate: 0.12,
        fte: 18,
        hourly_price: 1250,
        salary: 46_000,
    },
    DemoLevel {
        name: "C",
        next: Some("SrC"),
        months: &[1, 7],
        min_tenure: 12,
        base_rate: 0.2,
        fte: 16,
        hourly_price: 1450,
        salary: 52_000,
    },
    DemoLevel {
        name: "SrC",
        next: Some("AM"),
        months: &[1, 7],
        min_tenure: 12,
        base_rate: 0.15,
        fte: 12,
        hourly_price: 1650,
        salary: 60_000,
    },
    DemoLevel {
        name: "AM",
        next: Some("M"),
        months: &[1],
        min_tenure: 18,
        base_rate: 0.2,
        fte: 8,
        hourly_price: 1850,
        salary: 70_000,
    },
    DemoLevel {
        name: "M",
        next: None,
        months: &[],
        min_tenure: 0,
        base_rate: 0.0,
        fte: 5,
        hourly_price: 2100,
        salary: 85_000,
    },
];

fn consultant_role() -> RoleConfig {
    let levels = CONSULTANT_LEVELS
        .iter()
        .map(|l| LevelConfig {
            name: l.name.to_string(),
            next_level: l.next.map(str::to_string),
            progression_months: l.months.iter().copied().collect(),
            minimum_tenure_months: l.min_tenure,
            base_progression_rate: l.base_rate,
            cat_curve: None,
        })
        .collect();
    RoleConfig {
        billable: true,
        cat_curve: None,
        kind: RoleKind::Leveled { levels },
    }
}

fn consultant_cells(scale: u32) -> CellSet {
    let cells = CONSULTANT_LEVELS
        .iter()
        .map(|l| {
            let mut rates = MonthlyTable {
                default: MonthlyRates {
                    recruitment_rate: Some(if l.name == "A" { 0.04 } else { 0.005 }),
                    churn_rate: Some(0.015),
                    price: Some(Decimal::new(l.hourly_price, 0)),
                    salary: Some(Decimal::new(l.salary, 0)),
                    utilization: Some(if l.next.is_some() { 0.85 } else { 0.6 }),
                    ..Default::default()
                },
                ..Default::default()
            };
            // Graduate intake every September.
            if l.name == "A" {
                rates.calendar_months.insert(
                    9,
                    MonthlyRates {
                        recruitment_rate: Some(0.2),
                        ..Default::default()
                    },
                );
            }
            (
                l.name.to_string(),
                CellConfig {
                    fte: l.fte * scale,
                    initial_tenure_months: 8,
                    rates,
                },
            )
        })
        .collect();
    CellSet::Leveled(cells)
}

fn operations_cell(scale: u32) -> CellSet {
    CellSet::Flat(CellConfig {
        fte: 6 * scale,
        initial_tenure_months: 24,
        rates: MonthlyTable {
            default: MonthlyRates {
                recruitment_rate: Some(0.01),
                churn_rate: Some(0.01),
                salary: Some(Decimal::new(38_000, 0)),
                ..Default::default()
            },
            ..Default::default()
        },
    })
}

/// Sample firm: a six-level Consultant ladder plus flat Operations per office.
/// Office `i` (in the given order) is `i + 1` times the base size.
pub fn demo_config(
    offices: &[&str],
    start: YearMonth,
    end: YearMonth,
    seed: u64,
) -> ResolvedConfig {
    let mut roles = BTreeMap::new();
    roles.insert("Consultant".to_string(), consultant_role());
    roles.insert(
        "Operations".to_string(),
        RoleConfig {
            billable: false,
            cat_curve: None,
            kind: RoleKind::Flat,
        },
    );

    let offices = offices
        .iter()
        .zip(1u32..)
        .map(|(name, scale)| {
            let mut cells = BTreeMap::new();
            cells.insert("Consultant".to_string(), consultant_cells(scale));
            cells.insert("Operations".to_string(), operations_cell(scale));
            (
                OfficeId(name.to_string()),
                OfficeConfig {
                    other_monthly_expense: None,
                    roles: cells,
                },
            )
        })
        .collect();

    ResolvedConfig {
        run: RunParams {
            start,
            end,
            office_scope: vec![],
            seed,
            price_increase: Decimal::new(3, 2),
            salary_increase: Decimal::new(25, 3),
            employment_cost_rate: Decimal::new(40, 2),
            standard_monthly_hours: Decimal::new(1664, 1),
            unplanned_absence_rate: Decimal::new(5, 2),
            other_monthly_expense: Decimal::new(250_000, 0),
            workers: 0,
        },
        roles,
        offices,
        global_targets: vec![],
    }
}
