//! Tenure-gated promotion model built on CAT curves.
//!
//! A CAT curve maps months-at-level to a multiplier on a level's base
//! progression rate. Promotion is only evaluated in the level's progression
//! months and once the minimum tenure is reached.

use crate::calendar::YearMonth;
use crate::config::{RoleConfig, RoleKind};
use crate::error::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Structural problems in a CAT curve.
#[derive(Debug, Error, PartialEq)]
pub enum CatCurveError {
    #[error("curve has no buckets")]
    Empty,
    #[error("first bucket must start at month 0, starts at {0}")]
    FirstBucketNotZero(u32),
    #[error("bucket starting at {lower} must have upper > lower")]
    EmptyBucket { lower: u32 },
    #[error("bucket starting at {found} does not continue from {expected}")]
    Discontinuous { expected: u32, found: u32 },
    #[error("last bucket must be open-ended")]
    BoundedTail,
    #[error("only the last bucket may be open-ended")]
    OpenBucketNotLast,
    #[error("multiplier {0} must be finite and >= 0")]
    InvalidMultiplier(f64),
}

/// Tenure range `[lower, upper)` in months with its multiplier; `upper = None` means unbounded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatBucket {
    pub lower: u32,
    #[serde(default)]
    pub upper: Option<u32>,
    pub multiplier: f64,
}

/// Ordered, contiguous tenure buckets covering every tenure from 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatCurve {
    pub buckets: Vec<CatBucket>,
}

impl CatCurve {
    /// 0-6: 0.0, 6-12: 0.5, 12-18: 1.0, 18-24: 1.5, 24+: 2.0.
    pub fn standard() -> Self {
        let b = |lower, upper, multiplier| CatBucket {
            lower,
            upper,
            multiplier,
        };
        Self {
            buckets: vec![
                b(0, Some(6), 0.0),
                b(6, Some(12), 0.5),
                b(12, Some(18), 1.0),
                b(18, Some(24), 1.5),
                b(24, None, 2.0),
            ],
        }
    }

    /// Single open bucket with the given multiplier.
    pub fn flat(multiplier: f64) -> Self {
        Self {
            buckets: vec![CatBucket {
                lower: 0,
                upper: None,
                multiplier,
            }],
        }
    }

    pub fn validate(&self) -> Result<(), CatCurveError> {
        let first = self.buckets.first().ok_or(CatCurveError::Empty)?;
        if first.lower != 0 {
            return Err(CatCurveError::FirstBucketNotZero(first.lower));
        }
        let mut expected = 0;
        let last = self.buckets.len() - 1;
        for (i, bucket) in self.buckets.iter().enumerate() {
            if !bucket.multiplier.is_finite() || bucket.multiplier < 0.0 {
                return Err(CatCurveError::InvalidMultiplier(bucket.multiplier));
            }
            if bucket.lower != expected {
                return Err(CatCurveError::Discontinuous {
                    expected,
                    found: bucket.lower,
                });
            }
            match bucket.upper {
                Some(upper) if upper <= bucket.lower => {
                    return Err(CatCurveError::EmptyBucket {
                        lower: bucket.lower,
                    })
                }
                Some(_) if i == last => return Err(CatCurveError::BoundedTail),
                Some(upper) => expected = upper,
                None if i != last => return Err(CatCurveError::OpenBucketNotLast),
                None => {}
            }
        }
        Ok(())
    }

    /// Multiplier for a tenure; a validated curve always has a match.
    pub fn multiplier(&self, tenure_months: u32) -> f64 {
        self.buckets
            .iter()
            .find(|b| tenure_months >= b.lower && b.upper.map_or(true, |u| tenure_months < u))
            .map_or(0.0, |b| b.multiplier)
    }
}

/// Promotion rule for one level.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressionRule {
    pub level: String,
    pub next_level: Option<String>,
    pub progression_months: BTreeSet<u32>,
    pub minimum_tenure_months: u32,
    pub base_rate: f64,
    pub curve: CatCurve,
}

impl ProgressionRule {
    /// Promotion probability for a tenure, clamped to [0,1].
    pub fn probability(&self, tenure_months: u32) -> f64 {
        (self.curve.multiplier(tenure_months) * self.base_rate).clamp(0.0, 1.0)
    }

    /// Calendar-month and minimum-tenure gate.
    pub fn is_eligible(&self, month: YearMonth, tenure_months: u32) -> bool {
        self.progression_months.contains(&month.month())
            && tenure_months >= self.minimum_tenure_months
    }

    pub fn is_terminal(&self) -> bool {
        self.next_level.is_none()
    }

    /// One Bernoulli draw for an eligible person. Ineligible people and
    /// terminal levels never progress and consume no randomness.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, month: YearMonth, tenure_months: u32) -> bool {
        if self.is_terminal() || !self.is_eligible(month, tenure_months) {
            return false;
        }
        rng.gen_bool(self.probability(tenure_months))
    }
}

/// Compiled promotion rules for every leveled role, plus level ordering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressionModel {
    rules: BTreeMap<(String, String), ProgressionRule>,
    order: BTreeMap<String, Vec<String>>,
}

impl ProgressionModel {
    /// Validate and compile role definitions.
    pub fn from_roles(roles: &BTreeMap<String, RoleConfig>) -> Result<Self, ConfigError> {
        let mut model = ProgressionModel::default();
        for (role, cfg) in roles {
            let RoleKind::Leveled { levels } = &cfg.kind else {
                continue;
            };
            let mut names = BTreeSet::new();
            for level in levels {
                if !names.insert(level.name.as_str()) {
                    return Err(ConfigError::DuplicateLevel {
                        role: role.clone(),
                        level: level.name.clone(),
                    });
                }
            }
            for level in levels {
                let invalid = |reason: String| ConfigError::InvalidProgression {
                    role: role.clone(),
                    level: level.name.clone(),
                    reason,
                };
                if let Some(next) = &level.next_level {
                    if !names.contains(next.as_str()) {
                        return Err(ConfigError::UnknownNextLevel {
                            role: role.clone(),
                            level: level.name.clone(),
                            next: next.clone(),
                        });
                    }
                    if next == &level.name {
                        return Err(invalid("next_level points to itself".into()));
                    }
                }
                let months = &level.progression_months;
                if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
                    return Err(invalid(format!("progression month {bad} outside 1..=12")));
                }
                if !level.base_progression_rate.is_finite()
                    || !(0.0..=1.0).contains(&level.base_progression_rate)
                {
                    return Err(invalid(format!(
                        "base progression rate {} outside [0,1]",
                        level.base_progression_rate
                    )));
                }
                let curve = level
                    .cat_curve
                    .clone()
                    .or_else(|| cfg.cat_curve.clone())
                    .unwrap_or_else(CatCurve::standard);
                curve
                    .validate()
                    .map_err(|source| ConfigError::MalformedCatCurve {
                        role: role.clone(),
                        level: level.name.clone(),
                        source,
                    })?;
                model.rules.insert(
                    (role.clone(), level.name.clone()),
                    ProgressionRule {
                        level: level.name.clone(),
                        next_level: level.next_level.clone(),
                        progression_months: level.progression_months.clone(),
                        minimum_tenure_months: level.minimum_tenure_months,
                        base_rate: level.base_progression_rate,
                        curve,
                    },
                );
            }
            model
                .order
                .insert(role.clone(), levels.iter().map(|l| l.name.clone()).collect());
        }
        Ok(model)
    }

    pub fn rule(&self, role: &str, level: &str) -> Option<&ProgressionRule> {
        self.rules.get(&(role.to_string(), level.to_string()))
    }

    /// Levels of a leveled role in configured order; empty for flat or unknown roles.
    pub fn levels(&self, role: &str) -> &[String] {
        self.order.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `probability(level, tenure)` for a role; `None` if the level is unknown.
    pub fn probability(&self, role: &str, level: &str, tenure_months: u32) -> Option<f64> {
        self.rule(role, level).map(|r| r.probability(tenure_months))
    }
}
