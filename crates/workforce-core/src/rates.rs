//! Monthly rate tables and the single rate-vs-absolute resolution rule.

use crate::calendar::YearMonth;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from resolving a movement into a headcount.
#[derive(Debug, Error, PartialEq)]
pub enum RateError {
    /// Neither a rate nor an absolute value was supplied.
    #[error("neither rate nor absolute value present")]
    Missing,
    /// Negative rates or counts are configuration errors.
    #[error("negative value {0}")]
    Negative(f64),
    /// NaN or infinite input.
    #[error("non-finite value")]
    NonFinite,
    /// More people than one cell can move in a month.
    #[error("{0} people exceeds the per-month limit of {}", MAX_MOVEMENT)]
    TooLarge(f64),
}

/// Upper bound on people hired or lost by one cell in one month.
pub const MAX_MOVEMENT: u32 = 1_000_000;

/// A recruitment or churn input, tagged as a fraction of FTE or an absolute count.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    /// Fraction of the relevant FTE, e.g. 0.02 for 2%.
    Rate(f64),
    /// Absolute head count for the month.
    Absolute(f64),
}

impl Movement {
    /// Build from optional parts; the absolute value wins when both are present.
    pub fn from_parts(rate: Option<f64>, absolute: Option<f64>) -> Option<Self> {
        match (rate, absolute) {
            (_, Some(a)) => Some(Movement::Absolute(a)),
            (Some(r), None) => Some(Movement::Rate(r)),
            (None, None) => None,
        }
    }

    fn raw(&self) -> f64 {
        match *self {
            Movement::Rate(v) | Movement::Absolute(v) => v,
        }
    }

    pub fn validate(&self) -> Result<(), RateError> {
        let v = self.raw();
        if !v.is_finite() {
            return Err(RateError::NonFinite);
        }
        if v < 0.0 {
            return Err(RateError::Negative(v));
        }
        if matches!(self, Movement::Absolute(_)) && v.round() > f64::from(MAX_MOVEMENT) {
            return Err(RateError::TooLarge(v));
        }
        Ok(())
    }

    /// Whole number of people for a cohort of `fte`.
    ///
    /// Absolute values are rounded; rates give `round(rate * fte)`. Rounding is
    /// half away from zero. Results above [`MAX_MOVEMENT`] are rejected.
    pub fn resolve(&self, fte: u32) -> Result<u32, RateError> {
        self.validate()?;
        let exact = match *self {
            Movement::Absolute(a) => a,
            Movement::Rate(r) => r * f64::from(fte),
        };
        let n = exact.round();
        if n > f64::from(MAX_MOVEMENT) {
            return Err(RateError::TooLarge(n));
        }
        Ok(n as u32)
    }
}

/// Resolve an optional rate/absolute pair against `fte`.
pub fn resolve_count(rate: Option<f64>, absolute: Option<f64>, fte: u32) -> Result<u32, RateError> {
    Movement::from_parts(rate, absolute)
        .ok_or(RateError::Missing)?
        .resolve(fte)
}

/// Partial monthly entry; unset fields fall through to a lower-precedence layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonthlyRates {
    pub recruitment_rate: Option<f64>,
    pub recruitment_abs: Option<f64>,
    pub churn_rate: Option<f64>,
    pub churn_abs: Option<f64>,
    /// Hourly price charged for billable staff.
    pub price: Option<Decimal>,
    /// Monthly gross salary per person.
    pub salary: Option<Decimal>,
    /// Billable share of available hours, in [0,1].
    pub utilization: Option<f64>,
}

impl MonthlyRates {
    /// Fields of `top` replace the corresponding fields of `self`.
    ///
    /// A movement's rate and absolute value count as one field: a layer that
    /// sets either replaces both, so a monthly rate can override a default
    /// absolute count.
    pub fn overlay(&self, top: &MonthlyRates) -> MonthlyRates {
        let (recruitment_rate, recruitment_abs) = movement_pair(
            (top.recruitment_rate, top.recruitment_abs),
            (self.recruitment_rate, self.recruitment_abs),
        );
        let (churn_rate, churn_abs) =
            movement_pair((top.churn_rate, top.churn_abs), (self.churn_rate, self.churn_abs));
        MonthlyRates {
            recruitment_rate,
            recruitment_abs,
            churn_rate,
            churn_abs,
            price: top.price.or(self.price),
            salary: top.salary.or(self.salary),
            utilization: top.utilization.or(self.utilization),
        }
    }
}

fn movement_pair(
    top: (Option<f64>, Option<f64>),
    base: (Option<f64>, Option<f64>),
) -> (Option<f64>, Option<f64>) {
    match top {
        (None, None) => base,
        set => set,
    }
}

/// Layered monthly table for one office/role/level cell.
///
/// Precedence when resolving a month: exact period, then calendar month
/// (applied every year), then the default layer. Fields merge one by one,
/// except that a movement's rate/absolute pair is taken from a single layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonthlyTable {
    pub default: MonthlyRates,
    pub calendar_months: BTreeMap<u32, MonthlyRates>,
    pub periods: BTreeMap<YearMonth, MonthlyRates>,
}

impl MonthlyTable {
    pub fn resolve(&self, month: YearMonth) -> MonthlyRates {
        let mut merged = self.default.clone();
        if let Some(cal) = self.calendar_months.get(&month.month()) {
            merged = merged.overlay(cal);
        }
        if let Some(period) = self.periods.get(&month) {
            merged = merged.overlay(period);
        }
        merged
    }
}

/// Fully resolved inputs for one cell in one month.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellRates {
    pub recruitment: Movement,
    pub churn: Movement,
    pub price: Decimal,
    pub salary: Decimal,
    pub utilization: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn absolute_takes_precedence() {
        assert_eq!(resolve_count(Some(0.5), Some(3.0), 100), Ok(3));
        assert_eq!(resolve_count(Some(0.05), None, 100), Ok(5));
        assert_eq!(resolve_count(None, None, 100), Err(RateError::Missing));
    }

    #[test]
    fn rate_is_a_fraction_not_a_percent() {
        // 2% of 150 people is 3, not 0.03.
        assert_eq!(resolve_count(Some(0.02), None, 150), Ok(3));
        assert_eq!(resolve_count(Some(0.025), None, 100), Ok(3));
        assert_eq!(resolve_count(Some(0.024), None, 100), Ok(2));
    }

    #[test]
    fn negative_and_nan_rejected() {
        assert_eq!(resolve_count(None, Some(-1.0), 10), Err(RateError::Negative(-1.0)));
        assert_eq!(resolve_count(Some(f64::NAN), None, 10), Err(RateError::NonFinite));
    }

    #[test]
    fn table_layers_merge_by_field() {
        let ym = |y, m| YearMonth::new(y, m).unwrap();
        let mut table = MonthlyTable {
            default: MonthlyRates {
                recruitment_rate: Some(0.01),
                churn_rate: Some(0.01),
                salary: Some(Decimal::new(4000, 0)),
                ..Default::default()
            },
            ..Default::default()
        };
        table.calendar_months.insert(
            9,
            MonthlyRates {
                recruitment_abs: Some(10.0),
                ..Default::default()
            },
        );
        table.periods.insert(
            ym(2026, 9),
            MonthlyRates {
                salary: Some(Decimal::new(4500, 0)),
                ..Default::default()
            },
        );

        let jan = table.resolve(ym(2025, 1));
        assert_eq!(jan.recruitment_abs, None);
        assert_eq!(jan.salary, Some(Decimal::new(4000, 0)));

        let sep25 = table.resolve(ym(2025, 9));
        assert_eq!(sep25.recruitment_abs, Some(10.0));
        assert_eq!(sep25.recruitment_rate, None);
        assert_eq!(sep25.churn_rate, Some(0.01));
        assert_eq!(sep25.salary, Some(Decimal::new(4000, 0)));

        let sep26 = table.resolve(ym(2026, 9));
        assert_eq!(sep26.recruitment_abs, Some(10.0));
        assert_eq!(sep26.salary, Some(Decimal::new(4500, 0)));
    }

    #[test]
    fn layer_rate_replaces_default_absolute() {
        let ym = |y, m| YearMonth::new(y, m).unwrap();
        let mut table = MonthlyTable {
            default: MonthlyRates {
                recruitment_abs: Some(4.0),
                churn_abs: Some(1.0),
                ..Default::default()
            },
            ..Default::default()
        };
        table.periods.insert(
            ym(2025, 3),
            MonthlyRates {
                recruitment_rate: Some(0.1),
                ..Default::default()
            },
        );
        let march = table.resolve(ym(2025, 3));
        assert_eq!((march.recruitment_rate, march.recruitment_abs), (Some(0.1), None));
        assert_eq!(march.churn_abs, Some(1.0));
        assert_eq!(
            resolve_count(march.recruitment_rate, march.recruitment_abs, 50),
            Ok(5)
        );
        let april = table.resolve(ym(2025, 4));
        assert_eq!(april.recruitment_abs, Some(4.0));
    }

    #[test]
    fn oversized_movements_rejected() {
        assert_eq!(
            Movement::Absolute(1e12).validate(),
            Err(RateError::TooLarge(1e12))
        );
        assert_eq!(resolve_count(None, Some(1e12), 10), Err(RateError::TooLarge(1e12)));
        assert_eq!(
            resolve_count(Some(1e6), None, 1_000),
            Err(RateError::TooLarge(1e9))
        );
        assert_eq!(
            resolve_count(None, Some(f64::from(MAX_MOVEMENT)), 0),
            Ok(MAX_MOVEMENT)
        );
    }

    proptest! {
        #[test]
        fn resolved_rate_within_half_unit(rate in 0.0f64..1.0, fte in 0u32..10_000) {
            let n = resolve_count(Some(rate), None, fte).unwrap();
            let exact = rate * f64::from(fte);
            prop_assert!((f64::from(n) - exact).abs() <= 0.5 + 1e-9);
        }
    }
}
