#![deny(warnings)]

//! Financial rollup: revenue, salary cost and EBITDA from headcounts.
//!
//! This crate provides validated utilities for:
//! - Annual price/salary escalation stepped once per calendar year
//! - Monthly office financials from end-of-month headcounts
//! - Period summaries (yearly, firm-wide) with recomputed margins

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use workforce_core::RunParams;

/// Errors produced by the financial rollup.
#[derive(Debug, Error, PartialEq)]
pub enum FinanceError {
    /// A ratio could not be represented as a decimal.
    #[error("non-finite numeric value {0}")]
    NonFinite(f64),
    /// Decimal arithmetic overflowed.
    #[error("decimal overflow while computing {0}")]
    Overflow(&'static str),
}

fn mul(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, FinanceError> {
    a.checked_mul(b).ok_or(FinanceError::Overflow(what))
}

fn add(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, FinanceError> {
    a.checked_add(b).ok_or(FinanceError::Overflow(what))
}

fn ratio(value: f64) -> Result<Decimal, FinanceError> {
    if !value.is_finite() {
        return Err(FinanceError::NonFinite(value));
    }
    Decimal::from_f64(value).ok_or(FinanceError::NonFinite(value))
}

/// Compound annual escalation: `(1 + annual)^years`.
///
/// Example:
/// let f = escalation_factor(Decimal::new(10, 2), 2).unwrap();
/// assert_eq!(f, Decimal::new(121, 2));
pub fn escalation_factor(annual: Decimal, years: u32) -> Result<Decimal, FinanceError> {
    let step = Decimal::ONE + annual;
    (0..years).try_fold(Decimal::ONE, |acc, _| mul(acc, step, "escalation"))
}

/// EBITDA over revenue; zero when there is no revenue.
pub fn margin(revenue: Decimal, ebitda: Decimal) -> Decimal {
    if revenue.is_zero() {
        Decimal::ZERO
    } else {
        ebitda / revenue
    }
}

/// Run-wide financial parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct FinancialParams {
    pub standard_monthly_hours: Decimal,
    pub unplanned_absence_rate: Decimal,
    pub employment_cost_rate: Decimal,
    pub price_increase: Decimal,
    pub salary_increase: Decimal,
    /// Calendar year of the first simulated month; escalation counts from here.
    pub base_year: i32,
}

impl FinancialParams {
    pub fn from_run(run: &RunParams) -> Self {
        Self {
            standard_monthly_hours: run.standard_monthly_hours,
            unplanned_absence_rate: run.unplanned_absence_rate,
            employment_cost_rate: run.employment_cost_rate,
            price_increase: run.price_increase,
            salary_increase: run.salary_increase,
            base_year: run.start.year(),
        }
    }

    /// Hours a consultant can bill in a month before utilization.
    pub fn available_hours(&self) -> Decimal {
        self.standard_monthly_hours * (Decimal::ONE - self.unplanned_absence_rate)
    }

    pub fn employment_cost_multiplier(&self) -> Decimal {
        Decimal::ONE + self.employment_cost_rate
    }

    /// Calendar-year boundaries crossed since the start of the run.
    pub fn years_elapsed(&self, year: i32) -> u32 {
        u32::try_from(year - self.base_year).unwrap_or(0)
    }

    pub fn escalated_price(&self, base: Decimal, year: i32) -> Result<Decimal, FinanceError> {
        mul(
            base,
            escalation_factor(self.price_increase, self.years_elapsed(year))?,
            "price",
        )
    }

    pub fn escalated_salary(&self, base: Decimal, year: i32) -> Result<Decimal, FinanceError> {
        mul(
            base,
            escalation_factor(self.salary_increase, self.years_elapsed(year))?,
            "salary",
        )
    }
}

/// End-of-month headcount of one cell with its base (unescalated) rates.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadcountLine {
    pub headcount: u32,
    pub billable: bool,
    pub hourly_price: Decimal,
    pub utilization: f64,
    pub monthly_salary: Decimal,
}

/// Monthly KPIs for one office.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OfficeFinancials {
    pub revenue: Decimal,
    pub salary_cost: Decimal,
    pub operating_costs: Decimal,
    pub ebitda: Decimal,
    pub margin: Decimal,
    pub billable_fte: u32,
    pub total_fte: u32,
    /// Headcount-weighted escalated hourly price of billable staff.
    pub average_hourly_price: Decimal,
}

/// Roll one office's month up into financial KPIs.
///
/// revenue = Σ price × utilization × available hours × headcount (billable only)
/// salary cost = Σ salary × (1 + employment cost rate) × headcount
/// ebitda = revenue − (salary cost + operating costs)
pub fn office_month(
    lines: &[HeadcountLine],
    operating_costs: Decimal,
    params: &FinancialParams,
    year: i32,
) -> Result<OfficeFinancials, FinanceError> {
    let hours = params.available_hours();
    let multiplier = params.employment_cost_multiplier();
    let mut out = OfficeFinancials {
        operating_costs,
        ..Default::default()
    };
    let mut price_weighted = Decimal::ZERO;
    for line in lines {
        let hc = Decimal::from(line.headcount);
        out.total_fte += line.headcount;
        let salary = params.escalated_salary(line.monthly_salary, year)?;
        out.salary_cost = add(
            out.salary_cost,
            mul(mul(salary, multiplier, "salary cost")?, hc, "salary cost")?,
            "salary cost",
        )?;
        if !line.billable {
            continue;
        }
        let price = params.escalated_price(line.hourly_price, year)?;
        let billed_hours = mul(hours, ratio(line.utilization)?, "revenue")?;
        out.revenue = add(
            out.revenue,
            mul(mul(price, billed_hours, "revenue")?, hc, "revenue")?,
            "revenue",
        )?;
        out.billable_fte += line.headcount;
        price_weighted = add(price_weighted, mul(price, hc, "price")?, "price")?;
    }
    let costs = add(out.salary_cost, operating_costs, "costs")?;
    out.ebitda = out.revenue - costs;
    out.margin = margin(out.revenue, out.ebitda);
    if out.billable_fte > 0 {
        out.average_hourly_price = price_weighted / Decimal::from(out.billable_fte);
    }
    debug!(
        revenue = %out.revenue,
        ebitda = %out.ebitda,
        fte = out.total_fte,
        "office month rolled up"
    );
    Ok(out)
}

/// Money totals over a period (a year, or a set of offices).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub revenue: Decimal,
    pub salary_cost: Decimal,
    pub operating_costs: Decimal,
    pub ebitda: Decimal,
    pub margin: Decimal,
    /// Number of office-months summed.
    pub months: u32,
}

impl FinancialSummary {
    /// Sum money fields and recompute the margin.
    pub fn from_months<'a, I>(months: I) -> Self
    where
        I: IntoIterator<Item = &'a OfficeFinancials>,
    {
        let mut s = FinancialSummary::default();
        for m in months {
            s.revenue += m.revenue;
            s.salary_cost += m.salary_cost;
            s.operating_costs += m.operating_costs;
            s.ebitda += m.ebitda;
            s.months += 1;
        }
        s.margin = margin(s.revenue, s.ebitda);
        s
    }

    /// Combine two summaries, e.g. offices into a firm total.
    pub fn merge(&self, other: &FinancialSummary) -> FinancialSummary {
        let revenue = self.revenue + other.revenue;
        let ebitda = self.ebitda + other.ebitda;
        FinancialSummary {
            revenue,
            salary_cost: self.salary_cost + other.salary_cost,
            operating_costs: self.operating_costs + other.operating_costs,
            ebitda,
            margin: margin(revenue, ebitda),
            months: self.months + other.months,
        }
    }
}
