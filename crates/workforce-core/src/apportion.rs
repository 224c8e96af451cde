//! Largest-remainder apportionment of firm-wide targets to offices.

use crate::OfficeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ApportionError {
    #[error("target must be finite and >= 0, got {0}")]
    InvalidTarget(f64),
    #[error("weight for office {office} must be finite and >= 0, got {weight}")]
    InvalidWeight { office: OfficeId, weight: f64 },
}

/// Outcome of distributing one global value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apportionment {
    /// Integer share per office; every weighted office has an entry.
    pub allocations: BTreeMap<OfficeId, u32>,
    /// `round(total)`.
    pub target: u32,
    /// Units that had no eligible office.
    pub dropped: u32,
}

impl Apportionment {
    pub fn allocated(&self) -> u32 {
        self.allocations.values().sum()
    }

    /// True when every weight was zero and nothing was distributed.
    pub fn is_unweighted(&self) -> bool {
        self.target > 0 && self.allocated() == 0 && self.dropped == self.target
    }

    pub fn get(&self, office: &OfficeId) -> u32 {
        self.allocations.get(office).copied().unwrap_or(0)
    }
}

/// Split `round(total)` across offices proportionally to `weights`.
///
/// Each office gets the floor of its exact share; the remaining units go one
/// by one to the largest fractional remainders, ties broken by office id.
/// Zero-weight offices never receive units.
pub fn apportion(
    total: f64,
    weights: &BTreeMap<OfficeId, f64>,
) -> Result<Apportionment, ApportionError> {
    if !total.is_finite() || total < 0.0 {
        return Err(ApportionError::InvalidTarget(total));
    }
    for (office, &weight) in weights {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ApportionError::InvalidWeight {
                office: office.clone(),
                weight,
            });
        }
    }
    let target = total.round().min(f64::from(u32::MAX)) as u32;
    let mut allocations: BTreeMap<OfficeId, u32> =
        weights.keys().map(|o| (o.clone(), 0)).collect();
    let weight_sum: f64 = weights.values().sum();
    if weight_sum <= 0.0 {
        return Ok(Apportionment {
            allocations,
            target,
            dropped: target,
        });
    }

    let mut remainders: Vec<(&OfficeId, f64)> = Vec::with_capacity(weights.len());
    let mut assigned: u32 = 0;
    for (office, &weight) in weights.iter().filter(|(_, w)| **w > 0.0) {
        let exact = f64::from(target) * weight / weight_sum;
        let quota = exact.floor();
        let base = (quota as u32).min(target - assigned);
        assigned += base;
        allocations.insert(office.clone(), base);
        remainders.push((office, exact - quota));
    }
    remainders.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut left = target - assigned;
    for (office, _) in remainders {
        if left == 0 {
            break;
        }
        if let Some(slot) = allocations.get_mut(office) {
            *slot += 1;
            left -= 1;
        }
    }
    Ok(Apportionment {
        allocations,
        target,
        dropped: left,
    })
}
