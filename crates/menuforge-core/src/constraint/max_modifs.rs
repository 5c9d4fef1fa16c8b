//! Change budget against a baseline solution.

use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::ids::{DayId, SlotId};
use crate::plan::PlanIndex;
use crate::solution::Solution;

use super::{Constraint, Rule};

/// Bounds how far a solution may drift from a baseline: zero cost while the
/// number of changed slots stays within `max_modifs`, then a linear cost
/// per extra change.
///
/// This powers the "improve my plan without rewriting it" mode: the solver
/// trades each extra change against the residual cost it removes.
#[derive(Debug, Clone)]
pub struct MaxModifsConstraint {
    baseline: Arc<Solution>,
    max_modifs: usize,
    cost_per_modif: f64,
    day: Option<DayId>,
}

impl MaxModifsConstraint {
    pub fn new(baseline: Arc<Solution>, max_modifs: usize, cost_per_modif: f64) -> Self {
        MaxModifsConstraint {
            baseline,
            max_modifs,
            cost_per_modif,
            day: None,
        }
    }

    /// Restricts the change count to one day's slots.
    pub fn for_day(mut self, day: DayId) -> Self {
        self.day = Some(day);
        self
    }
}

impl Constraint for MaxModifsConstraint {
    fn key(&self) -> &str {
        "max_modifs"
    }

    fn compile(&self, plan: &PlanIndex) -> Result<Vec<Box<dyn Rule>>> {
        if !(self.cost_per_modif > 0.0) {
            return Err(CoreError::Configuration(format!(
                "max_modifs cost must be positive, got {}",
                self.cost_per_modif
            )));
        }
        let slot_ids = match self.day {
            Some(day) => plan
                .slot_ids_per_day
                .get(&day)
                .cloned()
                .ok_or_else(|| {
                    CoreError::Configuration(format!("max_modifs targets unknown day {day}"))
                })?,
            None => plan.all_slot_ids().to_vec(),
        };
        Ok(vec![Box::new(MaxModifsRule {
            baseline: Arc::clone(&self.baseline),
            max_modifs: self.max_modifs,
            cost_per_modif: self.cost_per_modif,
            slot_ids,
        })])
    }
}

#[derive(Debug)]
struct MaxModifsRule {
    baseline: Arc<Solution>,
    max_modifs: usize,
    cost_per_modif: f64,
    slot_ids: Vec<SlotId>,
}

impl Rule for MaxModifsRule {
    fn label(&self) -> String {
        "change budget".to_owned()
    }

    fn constraint_key(&self) -> &str {
        "max_modifs"
    }

    fn slot_ids(&self) -> &[SlotId] {
        &self.slot_ids
    }

    fn cost(&self, solution: &Solution) -> f64 {
        let modifs = solution.diff_count(&self.baseline, &self.slot_ids);
        modifs.saturating_sub(self.max_modifs) as f64 * self.cost_per_modif
    }
}
