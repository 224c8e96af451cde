#![deny(warnings)]

//! Simulation runtime: workforce state, the monthly transition engine and
//! the orchestrator that turns a [`ResolvedConfig`] into results.
//!
//! Each month runs in three phases:
//! 1. firm-wide targets are apportioned to the offices carrying the cell
//! 2. every office advances independently (in parallel when configured)
//! 3. end-of-month headcounts are rolled up into financials
//!
//! Offices own their random stream, so a run is reproducible from its seed
//! regardless of the worker count.

pub mod pool;
pub mod result;
pub mod state;
pub mod transition;

pub use pool::WorkerPool;
pub use result::{
    CellRecord, MonthlyResult, OfficeMonth, OfficeYear, RoleRecords, RoleSnapshot,
    SimulationResult, YearlyResult,
};
pub use state::{Cohort, OfficeState, Person, RoleState};
pub use transition::{
    advance_office, CellCounts, CellKey, CellOutcome, CellOverride, OfficeTransition, Overrides,
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use workforce_core::{
    apportion, validate_config, Anomaly, AnomalyKind, ApportionError, ConfigError, OfficeId,
    ProgressionModel, ResolvedConfig, YearMonth,
};
use workforce_econ::{office_month, FinanceError, FinancialParams, HeadcountLine};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("apportioning {role} target for {month}: {source}")]
    Apportion {
        role: String,
        month: YearMonth,
        #[source]
        source: ApportionError,
    },
    #[error("financial rollup failed for {office} in {month}: {source}")]
    Finance {
        office: OfficeId,
        month: YearMonth,
        #[source]
        source: FinanceError,
    },
    #[error("cannot start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("simulation already finished at {0}")]
    Finished(YearMonth),
}

/// One office with its private random stream.
struct OfficeRunner {
    state: OfficeState,
    rng: ChaCha8Rng,
}

impl OfficeRunner {
    fn new(cfg: &ResolvedConfig, id: &OfficeId, stream: u64) -> Result<Self, ConfigError> {
        let state = OfficeState::from_config(cfg, id, cfg.run.start)?;
        let mut rng = ChaCha8Rng::seed_from_u64(cfg.run.seed);
        rng.set_stream(stream);
        Ok(Self { state, rng })
    }
}

/// Month-by-month driver over a validated configuration.
pub struct Simulation<'a> {
    cfg: &'a ResolvedConfig,
    model: ProgressionModel,
    params: FinancialParams,
    pool: WorkerPool,
    runners: Vec<OfficeRunner>,
    next: Option<YearMonth>,
}

impl<'a> Simulation<'a> {
    /// Validate `cfg` and build the starting population of every in-scope office.
    pub fn new(cfg: &'a ResolvedConfig) -> Result<Self, SimError> {
        let model = validate_config(cfg)?;
        let pool = WorkerPool::new(cfg.run.workers)?;
        let runners = cfg
            .scope()
            .iter()
            .zip(0u64..)
            .map(|(id, stream)| OfficeRunner::new(cfg, id, stream))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            offices = runners.len(),
            start = %cfg.run.start,
            end = %cfg.run.end,
            seed = cfg.run.seed,
            workers = pool.workers(),
            "simulation initialised"
        );
        Ok(Self {
            cfg,
            model,
            params: FinancialParams::from_run(&cfg.run),
            pool,
            runners,
            next: Some(cfg.run.start),
        })
    }

    /// Month the next [`step`](Self::step) will simulate.
    pub fn current_month(&self) -> Option<YearMonth> {
        self.next
    }

    pub fn is_finished(&self) -> bool {
        self.next.is_none()
    }

    /// Current state of one office.
    pub fn state(&self, office: &OfficeId) -> Option<&OfficeState> {
        self.runners
            .iter()
            .map(|r| &r.state)
            .find(|s| &s.id == office)
    }

    /// Simulate one month for every office. A failed step ends the run.
    pub fn step(&mut self) -> Result<MonthlyResult, SimError> {
        let month = self.next.take().ok_or(SimError::Finished(self.cfg.run.end))?;
        let (overrides, mut anomalies) = apportion_targets(self.cfg, &self.runners, month)?;

        let cfg = self.cfg;
        let model = &self.model;
        let advance = |(runner, o): (&mut OfficeRunner, &Overrides)| {
            advance_office(&mut runner.state, cfg, model, month, o, &mut runner.rng)
        };
        let transitions: Vec<Result<OfficeTransition, ConfigError>> = if self.pool.is_sequential() {
            self.runners.iter_mut().zip(overrides.iter()).map(advance).collect()
        } else {
            let runners = &mut self.runners;
            self.pool.install(|| {
                runners
                    .par_iter_mut()
                    .zip(overrides.par_iter())
                    .map(advance)
                    .collect()
            })
        };

        let year = month.year();
        let mut offices = BTreeMap::new();
        let mut events = Vec::new();
        for (runner, transition) in self.runners.iter().zip(transitions) {
            let t = transition?;
            let id = &runner.state.id;
            let finance_err = |source| SimError::Finance {
                office: id.clone(),
                month,
                source,
            };
            let lines: Vec<HeadcountLine> = t
                .cells
                .iter()
                .map(|c| HeadcountLine {
                    headcount: c.counts.fte_end,
                    billable: c.billable,
                    hourly_price: c.rates.price,
                    utilization: c.rates.utilization,
                    monthly_salary: c.rates.salary,
                })
                .collect();
            let financial = office_month(&lines, cfg.office_expense(id), &self.params, year)
                .map_err(finance_err)?;

            let mut roles = BTreeMap::new();
            for c in &t.cells {
                let price = self
                    .params
                    .escalated_price(c.rates.price, year)
                    .map_err(finance_err)?;
                let salary = self
                    .params
                    .escalated_salary(c.rates.salary, year)
                    .map_err(finance_err)?;
                let record = CellRecord::new(month, &c.counts, price, salary);
                match &c.key.level {
                    None => {
                        roles.insert(c.key.role.clone(), RoleSnapshot::Flat(record));
                    }
                    Some(level) => {
                        let entry = roles
                            .entry(c.key.role.clone())
                            .or_insert_with(|| RoleSnapshot::Leveled(BTreeMap::new()));
                        if let RoleSnapshot::Leveled(levels) = entry {
                            levels.insert(level.clone(), record);
                        }
                    }
                }
            }
            events.extend(t.events);
            anomalies.extend(t.anomalies);
            offices.insert(
                id.clone(),
                OfficeMonth {
                    roles,
                    total_fte: financial.total_fte,
                    financial,
                },
            );
        }

        let result = MonthlyResult {
            month,
            offices,
            events,
            anomalies,
        };
        if month.closes_year() || month == cfg.run.end {
            info!(%month, fte = result.total_fte(), "year closed");
        } else {
            let events = result.events.len();
            debug!(%month, fte = result.total_fte(), events, "month simulated");
        }
        if month < cfg.run.end {
            self.next = Some(month.next());
        }
        Ok(result)
    }

    /// Simulate every remaining month.
    pub fn run(mut self) -> Result<SimulationResult, SimError> {
        let mut months = Vec::new();
        while !self.is_finished() {
            months.push(self.step()?);
        }
        let result = SimulationResult::from_months(months);
        info!(
            months = result.months.len(),
            events = result.events.len(),
            anomalies = result.anomalies.len(),
            "simulation finished"
        );
        Ok(result)
    }
}

/// Validate and run a whole scenario.
pub fn run_simulation(cfg: &ResolvedConfig) -> Result<SimulationResult, SimError> {
    Simulation::new(cfg)?.run()
}

fn firm_anomaly(
    month: YearMonth,
    role: &str,
    level: Option<&String>,
    kind: AnomalyKind,
) -> Anomaly {
    Anomaly {
        month,
        office: None,
        role: role.to_string(),
        level: level.cloned(),
        kind,
    }
}

/// Distribute this month's firm-wide targets over the offices carrying each
/// cell. Weights are the cell's current FTE, or the offices' total FTE when
/// no office has anyone in the cell.
fn apportion_targets(
    cfg: &ResolvedConfig,
    runners: &[OfficeRunner],
    month: YearMonth,
) -> Result<(Vec<Overrides>, Vec<Anomaly>), SimError> {
    let mut overrides = vec![Overrides::new(); runners.len()];
    let mut anomalies = Vec::new();
    for target in cfg.global_targets.iter().filter(|t| t.month == month) {
        let key = CellKey::new(&target.role, target.level.as_deref());
        let carriers: Vec<usize> = runners
            .iter()
            .enumerate()
            .filter(|(_, r)| r.state.has_cell(&key.role, key.level.as_deref()))
            .map(|(i, _)| i)
            .collect();
        let mut weights: BTreeMap<OfficeId, f64> = carriers
            .iter()
            .map(|&i| {
                let s = &runners[i].state;
                (s.id.clone(), f64::from(s.cell_fte(&key.role, key.level.as_deref())))
            })
            .collect();
        if weights.values().all(|w| *w == 0.0) {
            for &i in &carriers {
                let s = &runners[i].state;
                weights.insert(s.id.clone(), f64::from(s.total_fte()));
            }
        }

        for (value, is_recruitment) in [(target.recruitment, true), (target.churn, false)] {
            let Some(value) = value else {
                continue;
            };
            let split = apportion(value, &weights).map_err(|source| SimError::Apportion {
                role: target.role.clone(),
                month,
                source,
            })?;
            if split.is_unweighted() {
                warn!(
                    role = %target.role,
                    level = ?target.level,
                    %month,
                    target = split.target,
                    "global target has no weight to apportion by"
                );
                anomalies.push(firm_anomaly(
                    month,
                    &target.role,
                    target.level.as_ref(),
                    AnomalyKind::ZeroApportionmentWeight {
                        target: split.target,
                    },
                ));
            } else if split.dropped > 0 {
                warn!(
                    role = %target.role,
                    level = ?target.level,
                    %month,
                    units = split.dropped,
                    "apportionment units dropped"
                );
                anomalies.push(firm_anomaly(
                    month,
                    &target.role,
                    target.level.as_ref(),
                    AnomalyKind::ApportionmentDropped {
                        units: split.dropped,
                    },
                ));
            }
            for &i in &carriers {
                let n = split.get(&runners[i].state.id);
                let o = overrides[i].entry(key.clone()).or_default();
                if is_recruitment {
                    o.recruitment = Some(n);
                } else {
                    o.churn = Some(n);
                }
            }
            debug!(
                role = %target.role,
                level = ?target.level,
                %month,
                allocations = ?split.allocations,
                "target apportioned"
            );
        }
    }
    Ok((overrides, anomalies))
}

#[cfg(test)]
pub(crate) mod testing {
    use rust_decimal::Decimal;
    use std::collections::{BTreeMap, BTreeSet};
    use workforce_core::{
        CatCurve, CellConfig, CellSet, LevelConfig, MonthlyRates, MonthlyTable, OfficeConfig,
        OfficeId, ResolvedConfig, RoleConfig, RoleKind, RunParams, YearMonth,
    };

    pub fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn with_money(r: MonthlyRates) -> MonthlyRates {
        MonthlyRates {
            price: Some(Decimal::new(1000, 0)),
            salary: Some(Decimal::new(50_000, 0)),
            utilization: Some(0.8),
            ..r
        }
    }

    /// Consultant A -> B ladder. A is promotable in June after six months
    /// with probability 0.9; B starts empty and has no movements.
    pub fn ladder_config(
        offices: &[(&str, u32)],
        a: MonthlyRates,
        start: YearMonth,
        end: YearMonth,
    ) -> ResolvedConfig {
        let level = |name: &str, next: Option<&str>| LevelConfig {
            name: name.into(),
            next_level: next.map(str::to_string),
            progression_months: if next.is_some() { BTreeSet::from([6]) } else { BTreeSet::new() },
            minimum_tenure_months: 6,
            base_progression_rate: if next.is_some() { 0.9 } else { 0.0 },
            cat_curve: Some(CatCurve::flat(1.0)),
        };
        let mut roles = BTreeMap::new();
        roles.insert(
            "Consultant".to_string(),
            RoleConfig {
                billable: true,
                cat_curve: None,
                kind: RoleKind::Leveled {
                    levels: vec![level("A", Some("B")), level("B", None)],
                },
            },
        );
        let offices = offices
            .iter()
            .map(|(name, fte)| {
                let mut cells = BTreeMap::new();
                cells.insert(
                    "A".to_string(),
                    CellConfig {
                        fte: *fte,
                        initial_tenure_months: 12,
                        rates: MonthlyTable {
                            default: with_money(a.clone()),
                            ..Default::default()
                        },
                    },
                );
                cells.insert(
                    "B".to_string(),
                    CellConfig {
                        fte: 0,
                        initial_tenure_months: 0,
                        rates: MonthlyTable {
                            default: with_money(MonthlyRates {
                                recruitment_abs: Some(0.0),
                                churn_abs: Some(0.0),
                                ..Default::default()
                            }),
                            ..Default::default()
                        },
                    },
                );
                let mut roles = BTreeMap::new();
                roles.insert("Consultant".to_string(), CellSet::Leveled(cells));
                (
                    OfficeId::from(*name),
                    OfficeConfig {
                        other_monthly_expense: None,
                        roles,
                    },
                )
            })
            .collect();
        ResolvedConfig {
            run: RunParams {
                start,
                end,
                office_scope: vec![],
                seed: 7,
                price_increase: Decimal::new(10, 2),
                salary_increase: Decimal::new(5, 2),
                employment_cost_rate: Decimal::new(5, 1),
                standard_monthly_hours: Decimal::new(160, 0),
                unplanned_absence_rate: Decimal::ZERO,
                other_monthly_expense: Decimal::ZERO,
                workers: 1,
            },
            roles,
            offices,
            global_targets: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{ladder_config, ym};
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::BTreeSet;
    use workforce_core::demo::demo_config;
    use workforce_core::{EventKind, GlobalTarget, MonthlyRates, PersonId};

    fn abs(recruit: f64, churn: f64) -> MonthlyRates {
        MonthlyRates {
            recruitment_abs: Some(recruit),
            churn_abs: Some(churn),
            ..Default::default()
        }
    }

    fn office(name: &str) -> OfficeId {
        OfficeId::from(name)
    }

    /// `k` successes out of `n` draws at `p` lie within three standard deviations.
    fn assert_binomial(k: usize, n: u32, p: f64) {
        let mean = f64::from(n) * p;
        let spread = 3.0 * (mean * (1.0 - p)).sqrt();
        let k = k as f64;
        assert!(
            (mean - spread..=mean + spread).contains(&k),
            "{k} outside {mean} +/- {spread:.2}"
        );
    }

    #[test]
    fn june_run_promotes_survivors_but_not_hires() {
        let june = ym(2025, 6);
        let cfg = ladder_config(&[("Oslo", 100)], abs(5.0, 2.0), june, june);
        let result = run_simulation(&cfg).unwrap();
        let month = result.month(june).unwrap();
        let oslo = &month.offices[&office("Oslo")];
        let a = oslo.cell("Consultant", Some("A")).unwrap();
        let b = oslo.cell("Consultant", Some("B")).unwrap();
        assert_eq!((a.fte_start, a.recruited, a.churned), (100, 5, 2));
        // Leavers come from the starters, so 98 remain eligible.
        assert_binomial(a.promoted_out as usize, 98, 0.9);
        assert_eq!(b.promoted_in, a.promoted_out);
        assert_eq!(a.fte_end + b.fte_end, 103);
        assert_eq!(a.fte_end, 103 - a.promoted_out);

        let hired: BTreeSet<PersonId> = result
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Hired)
            .map(|e| e.person)
            .collect();
        assert_eq!(hired.len(), 5);
        assert!(result
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Promoted)
            .all(|e| !hired.contains(&e.person)));
    }

    #[test]
    fn single_month_recruit_and_churn() {
        let cfg = ladder_config(&[("Oslo", 100)], abs(5.0, 2.0), ym(2025, 1), ym(2025, 1));
        let result = run_simulation(&cfg).unwrap();
        assert_eq!(result.firm_total_fte(ym(2025, 1)), Some(103));
        let counts = result.event_counts();
        assert_eq!(counts[&EventKind::Hired], 5);
        assert_eq!(counts[&EventKind::Churned], 2);
        assert!(!counts.contains_key(&EventKind::Promoted));
    }

    #[test]
    fn june_promotions_respect_tenure_gate() {
        let cfg = ladder_config(&[("Oslo", 100)], abs(2.0, 0.0), ym(2025, 1), ym(2025, 6));
        let result = run_simulation(&cfg).unwrap();
        let promoted: Vec<_> = result
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Promoted)
            .collect();
        assert!(promoted.iter().all(|e| e.date == ym(2025, 6)));
        // All 100 starters are eligible in June.
        assert_binomial(promoted.len(), 100, 0.9);
        // Hires of this run have under six months at level in June.
        let hired: BTreeSet<PersonId> = result
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Hired)
            .map(|e| e.person)
            .collect();
        assert_eq!(hired.len(), 12);
        assert!(promoted.iter().all(|e| !hired.contains(&e.person)));

        let june = result.month(ym(2025, 6)).unwrap();
        let oslo = &june.offices[&office("Oslo")];
        let a = oslo.cell("Consultant", Some("A")).unwrap();
        let b = oslo.cell("Consultant", Some("B")).unwrap();
        assert_eq!(a.promoted_out as usize, promoted.len());
        assert_eq!(b.promoted_in, a.promoted_out);
        assert_eq!(a.fte_end + b.fte_end, 112);
    }

    #[test]
    fn same_seed_same_events_any_worker_count() {
        let offices = ["Oslo", "Stockholm", "Helsinki"];
        let mut cfg = demo_config(&offices, ym(2025, 1), ym(2026, 12), 42);
        cfg.run.workers = 1;
        let sequential = run_simulation(&cfg).unwrap();
        let again = run_simulation(&cfg).unwrap();
        assert_eq!(sequential.events, again.events);

        cfg.run.workers = 0;
        let global_pool = run_simulation(&cfg).unwrap();
        cfg.run.workers = 3;
        let dedicated = run_simulation(&cfg).unwrap();
        assert_eq!(sequential, global_pool);
        assert_eq!(sequential, dedicated);

        cfg.run.seed = 43;
        let other = run_simulation(&cfg).unwrap();
        assert_ne!(sequential.events, other.events);
    }

    #[test]
    fn global_target_is_apportioned_by_cell_fte() {
        let mut cfg = ladder_config(
            &[("A1", 50), ("B2", 30), ("C3", 20), ("D4", 0)],
            abs(5.0, 0.0),
            ym(2025, 1),
            ym(2025, 1),
        );
        cfg.global_targets.push(GlobalTarget {
            role: "Consultant".into(),
            level: Some("A".into()),
            month: ym(2025, 1),
            recruitment: Some(7.0),
            churn: None,
        });
        let result = run_simulation(&cfg).unwrap();
        let jan = result.month(ym(2025, 1)).unwrap();
        let recruited: Vec<u32> = ["A1", "B2", "C3", "D4"]
            .iter()
            .map(|o| jan.offices[&office(o)].cell("Consultant", Some("A")).unwrap().recruited)
            .collect();
        assert_eq!(recruited, vec![4, 2, 1, 0]);
        assert!(result.anomalies.is_empty());
    }

    #[test]
    fn empty_cell_falls_back_to_office_fte() {
        let mut cfg = ladder_config(
            &[("A1", 50), ("B2", 30), ("C3", 20), ("D4", 0)],
            abs(0.0, 0.0),
            ym(2025, 1),
            ym(2025, 1),
        );
        cfg.global_targets.push(GlobalTarget {
            role: "Consultant".into(),
            level: Some("B".into()),
            month: ym(2025, 1),
            recruitment: Some(7.0),
            churn: None,
        });
        let result = run_simulation(&cfg).unwrap();
        let jan = result.month(ym(2025, 1)).unwrap();
        let recruited: u32 = jan
            .offices
            .values()
            .map(|o| o.cell("Consultant", Some("B")).unwrap().recruited)
            .sum();
        assert_eq!(recruited, 7);
        assert_eq!(
            jan.offices[&office("D4")].cell("Consultant", Some("B")).unwrap().recruited,
            0
        );
    }

    #[test]
    fn unweighted_target_is_flagged_not_fatal() {
        let mut cfg = ladder_config(&[("Empty", 0)], abs(0.0, 0.0), ym(2025, 1), ym(2025, 2));
        cfg.global_targets.push(GlobalTarget {
            role: "Consultant".into(),
            level: Some("A".into()),
            month: ym(2025, 2),
            recruitment: Some(3.0),
            churn: None,
        });
        let result = run_simulation(&cfg).unwrap();
        assert_eq!(result.firm_total_fte(ym(2025, 2)), Some(0));
        assert_eq!(result.anomalies.len(), 1);
        assert_eq!(result.anomalies[0].office, None);
        assert_eq!(
            result.anomalies[0].kind,
            AnomalyKind::ZeroApportionmentWeight { target: 3 }
        );
    }

    #[test]
    fn missing_churn_aborts_before_month_one() {
        let a = MonthlyRates {
            recruitment_abs: Some(1.0),
            ..Default::default()
        };
        let cfg = ladder_config(&[("Oslo", 10)], a, ym(2025, 1), ym(2025, 3));
        match run_simulation(&cfg) {
            Err(SimError::Config(ConfigError::MissingEntry { month, field, .. })) => {
                assert_eq!(month, ym(2025, 1));
                assert_eq!(field, "churn");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stepping_past_the_end_fails() {
        let cfg = ladder_config(&[("Oslo", 10)], abs(0.0, 0.0), ym(2025, 1), ym(2025, 2));
        let mut sim = Simulation::new(&cfg).unwrap();
        assert_eq!(sim.current_month(), Some(ym(2025, 1)));
        sim.step().unwrap();
        sim.step().unwrap();
        assert!(sim.is_finished());
        assert!(matches!(sim.step(), Err(SimError::Finished(_))));
        assert_eq!(sim.state(&office("Oslo")).map(OfficeState::total_fte), Some(10));
    }

    #[test]
    fn years_follow_calendar_boundaries() {
        let cfg = ladder_config(&[("Oslo", 10)], abs(1.0, 0.0), ym(2025, 7), ym(2026, 6));
        let result = run_simulation(&cfg).unwrap();
        assert_eq!(result.years.keys().copied().collect::<Vec<_>>(), vec![2025, 2026]);
        assert_eq!(result.years[&2025].months.len(), 6);
        assert_eq!(result.years[&2026].months.len(), 6);
        assert_eq!(result.years[&2025].firm_total_fte(), 16);
        assert_eq!(result.years[&2026].firm_total_fte(), 22);
    }

    #[test]
    fn prices_and_salaries_step_up_in_january() {
        let cfg = ladder_config(&[("Oslo", 100)], abs(0.0, 0.0), ym(2025, 12), ym(2026, 1));
        let result = run_simulation(&cfg).unwrap();
        let cell = |m| {
            result.month(m).unwrap().offices[&office("Oslo")]
                .cell("Consultant", Some("A"))
                .cloned()
                .unwrap()
        };
        assert_eq!(cell(ym(2025, 12)).price, Decimal::new(1000, 0));
        assert_eq!(cell(ym(2026, 1)).price, Decimal::new(1100, 0));
        assert_eq!(cell(ym(2026, 1)).salary, Decimal::new(52_500, 0));

        let dec = &result.month(ym(2025, 12)).unwrap().offices[&office("Oslo")].financial;
        let expected_revenue = Decimal::new(12_800_000, 0);
        assert!((dec.revenue - expected_revenue).abs() < Decimal::new(1, 2));
        assert_eq!(dec.salary_cost, Decimal::new(7_500_000, 0));
    }

    #[test]
    fn baseline_scenario_runs() {
        let cfg: ResolvedConfig =
            serde_yaml::from_str(include_str!("../../../assets/scenarios/baseline.yaml")).unwrap();
        let result = run_simulation(&cfg).unwrap();
        assert_eq!(result.months.len(), 24);
        assert!(result.firm_total_fte(cfg.run.end).unwrap_or(0) > 0);
        assert!(result.event_counts().contains_key(&EventKind::Promoted));
    }

    #[test]
    fn results_serialize_for_export() {
        let cfg = ladder_config(&[("Oslo", 10)], abs(1.0, 1.0), ym(2025, 1), ym(2025, 2));
        let result = run_simulation(&cfg).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["years"]["2025"]["offices"]["Oslo"]["levels"]["Consultant"]["A"].is_array());
        assert_eq!(json["events"][0]["event_type"], "hired");
        assert_eq!(json["events"][0]["date"], "2025-01");
    }
}
