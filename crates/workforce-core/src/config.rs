//! Resolved run configuration and its validation.
//!
//! The configuration layer (spreadsheets, business plans, scenario storage)
//! lives outside this workspace; it hands the engine a fully resolved
//! [`ResolvedConfig`]. The value is immutable for the duration of a run.

use crate::calendar::YearMonth;
use crate::error::{CellRef, ConfigError};
use crate::progression::{CatCurve, ProgressionModel};
use crate::rates::{CellRates, Movement, MonthlyTable};
use crate::OfficeId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Global run parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    /// First simulated month.
    pub start: YearMonth,
    /// Last simulated month (inclusive).
    pub end: YearMonth,
    /// Offices to simulate; empty means every configured office.
    #[serde(default)]
    pub office_scope: Vec<OfficeId>,
    /// Seed for the per-office random streams.
    #[serde(default)]
    pub seed: u64,
    /// Annual hourly price escalation (e.g. 0.03 = 3%).
    #[serde(default)]
    pub price_increase: Decimal,
    /// Annual salary escalation.
    #[serde(default)]
    pub salary_increase: Decimal,
    /// Employer costs on top of gross salary (e.g. 0.40).
    #[serde(default)]
    pub employment_cost_rate: Decimal,
    /// Working hours per person per month.
    #[serde(default = "default_monthly_hours")]
    pub standard_monthly_hours: Decimal,
    /// Share of working hours lost to unplanned absence, in [0,1).
    #[serde(default)]
    pub unplanned_absence_rate: Decimal,
    /// Operating costs per office per month, unless the office overrides it.
    #[serde(default)]
    pub other_monthly_expense: Decimal,
    /// Worker threads for per-office transitions (0 = all cores, 1 = caller thread).
    #[serde(default)]
    pub workers: usize,
}

fn default_monthly_hours() -> Decimal {
    Decimal::new(1664, 1)
}

/// Definition of one level in a leveled role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Destination of a promotion; `None` for the terminal level.
    #[serde(default)]
    pub next_level: Option<String>,
    /// Calendar months (1..=12) in which promotion is evaluated.
    #[serde(default)]
    pub progression_months: BTreeSet<u32>,
    #[serde(default)]
    pub minimum_tenure_months: u32,
    /// Probability scaled by the CAT multiplier, in [0,1].
    #[serde(default)]
    pub base_progression_rate: f64,
    /// Overrides the role-wide curve.
    #[serde(default)]
    pub cat_curve: Option<CatCurve>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoleKind {
    /// Single cohort, e.g. Operations.
    Flat,
    /// Ordered levels, e.g. Consultant A, AC, C, ...
    Leveled { levels: Vec<LevelConfig> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Billable roles generate revenue.
    #[serde(default)]
    pub billable: bool,
    /// Default CAT curve for the role's levels.
    #[serde(default)]
    pub cat_curve: Option<CatCurve>,
    pub kind: RoleKind,
}

/// Starting population and monthly table for one office/role/level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellConfig {
    #[serde(default)]
    pub fte: u32,
    /// Tenure at level of the starting population.
    #[serde(default)]
    pub initial_tenure_months: u32,
    #[serde(default)]
    pub rates: MonthlyTable,
}

/// Cells of one role inside an office.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellSet {
    Leveled(BTreeMap<String, CellConfig>),
    Flat(CellConfig),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OfficeConfig {
    #[serde(default)]
    pub other_monthly_expense: Option<Decimal>,
    pub roles: BTreeMap<String, CellSet>,
}

/// Firm-wide absolute target for one role/level and month.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalTarget {
    pub role: String,
    #[serde(default)]
    pub level: Option<String>,
    pub month: YearMonth,
    #[serde(default)]
    pub recruitment: Option<f64>,
    #[serde(default)]
    pub churn: Option<f64>,
}

/// Everything a run needs, resolved ahead of time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub run: RunParams,
    pub roles: BTreeMap<String, RoleConfig>,
    pub offices: BTreeMap<OfficeId, OfficeConfig>,
    #[serde(default)]
    pub global_targets: Vec<GlobalTarget>,
}

/// One in-scope cell with its configuration.
#[derive(Clone, Debug)]
pub struct CellSpec<'a> {
    pub cell: CellRef,
    pub config: &'a CellConfig,
    pub billable: bool,
}

impl CellSpec<'_> {
    /// Hire and level-start month of the starting population.
    pub fn hire_anchor(&self, start: YearMonth) -> Result<YearMonth, ConfigError> {
        let tenure = self.config.initial_tenure_months;
        start
            .checked_sub_months(tenure)
            .ok_or_else(|| ConfigError::InvalidEntry {
                cell: self.cell.clone(),
                month: start,
                field: "initial_tenure_months",
                reason: format!("{tenure} months before {start} is outside the supported range"),
            })
    }

    /// Resolve and check the month's inputs for this cell.
    ///
    /// Recruitment, churn and salary are always required; price and
    /// utilization only for billable roles.
    pub fn rates(&self, month: YearMonth) -> Result<CellRates, ConfigError> {
        let r = self.config.rates.resolve(month);
        let missing = |field| ConfigError::MissingEntry {
            cell: self.cell.clone(),
            month,
            field,
        };
        let invalid = |field, reason: String| ConfigError::InvalidEntry {
            cell: self.cell.clone(),
            month,
            field,
            reason,
        };

        let recruitment = Movement::from_parts(r.recruitment_rate, r.recruitment_abs)
            .ok_or_else(|| missing("recruitment"))?;
        recruitment
            .validate()
            .map_err(|e| invalid("recruitment", e.to_string()))?;
        let churn =
            Movement::from_parts(r.churn_rate, r.churn_abs).ok_or_else(|| missing("churn"))?;
        churn.validate().map_err(|e| invalid("churn", e.to_string()))?;

        let salary = r.salary.ok_or_else(|| missing("salary"))?;
        if salary < Decimal::ZERO {
            return Err(invalid("salary", format!("negative value {salary}")));
        }
        let (price, utilization) = if self.billable {
            (
                r.price.ok_or_else(|| missing("price"))?,
                r.utilization.ok_or_else(|| missing("utilization"))?,
            )
        } else {
            (r.price.unwrap_or(Decimal::ZERO), r.utilization.unwrap_or(0.0))
        };
        if price < Decimal::ZERO {
            return Err(invalid("price", format!("negative value {price}")));
        }
        if !utilization.is_finite() || !(0.0..=1.0).contains(&utilization) {
            return Err(invalid("utilization", format!("{utilization} outside [0,1]")));
        }
        Ok(CellRates {
            recruitment,
            churn,
            price,
            salary,
            utilization,
        })
    }
}

impl ResolvedConfig {
    /// Offices simulated by this run, sorted and de-duplicated.
    pub fn scope(&self) -> Vec<OfficeId> {
        let mut scope: Vec<OfficeId> = if self.run.office_scope.is_empty() {
            self.offices.keys().cloned().collect()
        } else {
            self.run.office_scope.clone()
        };
        scope.sort();
        scope.dedup();
        scope
    }

    /// Every simulated month.
    pub fn months(&self) -> impl Iterator<Item = YearMonth> {
        self.run.start.iter_to(self.run.end)
    }

    /// Operating costs of an office for one month.
    pub fn office_expense(&self, office: &OfficeId) -> Decimal {
        self.offices
            .get(office)
            .and_then(|o| o.other_monthly_expense)
            .unwrap_or(self.run.other_monthly_expense)
    }

    /// Cells of an office: roles by name, levels in configured order.
    pub fn office_cells(&self, office: &OfficeId) -> Result<Vec<CellSpec<'_>>, ConfigError> {
        let oc = self
            .offices
            .get(office)
            .ok_or_else(|| ConfigError::UnknownOffice(office.clone()))?;
        let mut cells = Vec::new();
        for (role, set) in &oc.roles {
            let rc = self.roles.get(role).ok_or_else(|| ConfigError::UnknownRole {
                office: office.clone(),
                role: role.clone(),
            })?;
            let cell = |level: Option<&str>| CellRef {
                office: office.clone(),
                role: role.clone(),
                level: level.map(str::to_string),
            };
            match (&rc.kind, set) {
                (RoleKind::Flat, CellSet::Flat(config)) => cells.push(CellSpec {
                    cell: cell(None),
                    config,
                    billable: rc.billable,
                }),
                (RoleKind::Leveled { levels }, CellSet::Leveled(map)) => {
                    let unknown = map.keys().find(|k| !levels.iter().any(|l| &l.name == *k));
                    if let Some(extra) = unknown {
                        return Err(ConfigError::UnknownLevel {
                            cell: cell(Some(extra.as_str())),
                        });
                    }
                    for level in levels {
                        let config = map.get(&level.name).ok_or_else(|| ConfigError::MissingLevel {
                            cell: cell(Some(level.name.as_str())),
                        })?;
                        cells.push(CellSpec {
                            cell: cell(Some(level.name.as_str())),
                            config,
                            billable: rc.billable,
                        });
                    }
                }
                _ => return Err(ConfigError::ShapeMismatch { cell: cell(None) }),
            }
        }
        Ok(cells)
    }
}

fn check_param(name: &'static str, value: Decimal, ok: bool) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value: value.to_string(),
        })
    }
}

fn validate_params(run: &RunParams) -> Result<(), ConfigError> {
    if run.end < run.start {
        return Err(ConfigError::InvalidRange {
            start: run.start,
            end: run.end,
        });
    }
    let minus_one = -Decimal::ONE;
    check_param("price_increase", run.price_increase, run.price_increase > minus_one)?;
    check_param("salary_increase", run.salary_increase, run.salary_increase > minus_one)?;
    check_param(
        "employment_cost_rate",
        run.employment_cost_rate,
        run.employment_cost_rate >= Decimal::ZERO,
    )?;
    check_param(
        "standard_monthly_hours",
        run.standard_monthly_hours,
        run.standard_monthly_hours > Decimal::ZERO,
    )?;
    check_param(
        "unplanned_absence_rate",
        run.unplanned_absence_rate,
        run.unplanned_absence_rate >= Decimal::ZERO && run.unplanned_absence_rate < Decimal::ONE,
    )?;
    check_param(
        "other_monthly_expense",
        run.other_monthly_expense,
        run.other_monthly_expense >= Decimal::ZERO,
    )
}

fn validate_target(cfg: &ResolvedConfig, target: &GlobalTarget) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidGlobalTarget {
        role: target.role.clone(),
        level: target.level.clone(),
        month: target.month,
        reason,
    };
    let role = cfg
        .roles
        .get(&target.role)
        .ok_or_else(|| invalid("unknown role".into()))?;
    match (&role.kind, &target.level) {
        (RoleKind::Flat, None) => {}
        (RoleKind::Leveled { levels }, Some(level)) if levels.iter().any(|l| &l.name == level) => {}
        _ => return Err(invalid("level does not match the role definition".into())),
    }
    for value in [target.recruitment, target.churn].into_iter().flatten() {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(format!("value {value} must be finite and >= 0")));
        }
    }
    Ok(())
}

/// Validate the whole configuration for the run range and compile the
/// progression model. Every in-scope cell is resolved for every month so a
/// run never starts with a missing entry.
pub fn validate_config(cfg: &ResolvedConfig) -> Result<ProgressionModel, ConfigError> {
    validate_params(&cfg.run)?;
    let model = ProgressionModel::from_roles(&cfg.roles)?;
    let scope = cfg.scope();
    let mut cell_count = 0usize;
    for office in &scope {
        if cfg
            .offices
            .get(office)
            .and_then(|o| o.other_monthly_expense)
            .is_some_and(|e| e < Decimal::ZERO)
        {
            return Err(ConfigError::InvalidParameter {
                name: "other_monthly_expense",
                value: office.to_string(),
            });
        }
        for spec in cfg.office_cells(office)? {
            let months = &spec.config.rates.calendar_months;
            if let Some(bad) = months.keys().find(|m| !(1..=12).contains(*m)) {
                return Err(ConfigError::InvalidEntry {
                    cell: spec.cell.clone(),
                    month: cfg.run.start,
                    field: "calendar_months",
                    reason: format!("calendar month {bad} outside 1..=12"),
                });
            }
            spec.hire_anchor(cfg.run.start)?;
            for month in cfg.months() {
                spec.rates(month)?;
            }
            cell_count += 1;
        }
    }
    for target in &cfg.global_targets {
        validate_target(cfg, target)?;
    }
    info!(
        offices = scope.len(),
        cells = cell_count,
        months = cfg.run.start.months_until(cfg.run.end) + 1,
        "configuration validated"
    );
    Ok(model)
}
