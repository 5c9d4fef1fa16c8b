//! Nutrient (and scalar attribute) band constraints.

use crate::error::{CoreError, Result};
use crate::plan::PlanIndex;

use super::interval::{Band, IntervalRule};
use super::{Constraint, Rule};

/// Min/max band on the daily total of one data key, with tolerance-widened
/// day rules plus a stricter week-average rule.
///
/// Cost grows quadratically with the percent deviation outside the widened
/// band and is exactly 0 inside it.
#[derive(Debug, Clone)]
pub struct NutrientConstraint {
    data_key: String,
    band: Band,
    tolerance_min: f64,
    tolerance_max: f64,
    cost_per_percent_out: f64,
    weekly_rule: bool,
}

impl NutrientConstraint {
    pub fn new(data_key: impl Into<String>, band: Band) -> Self {
        NutrientConstraint {
            data_key: data_key.into(),
            band,
            tolerance_min: 0.25,
            tolerance_max: 0.25,
            cost_per_percent_out: 10.0,
            weekly_rule: true,
        }
    }

    /// Tolerance fractions applied to the day band only.
    pub fn with_tolerances(mut self, tolerance_min: f64, tolerance_max: f64) -> Self {
        self.tolerance_min = tolerance_min;
        self.tolerance_max = tolerance_max;
        self
    }

    pub fn with_cost_per_percent_out(mut self, cost: f64) -> Self {
        self.cost_per_percent_out = cost;
        self
    }

    /// Drops the week-scope rule; only day rules remain.
    pub fn without_weekly_rule(mut self) -> Self {
        self.weekly_rule = false;
        self
    }

    fn day_rules_enabled(&self) -> bool {
        (self.band.min.is_some() && self.tolerance_min < 1.0)
            || (self.band.max.is_some() && self.tolerance_max < 1.0)
    }
}

impl Constraint for NutrientConstraint {
    fn key(&self) -> &str {
        &self.data_key
    }

    fn compile(&self, plan: &PlanIndex) -> Result<Vec<Box<dyn Rule>>> {
        self.band.validate(&self.data_key)?;
        for tolerance in [self.tolerance_min, self.tolerance_max] {
            if !(0.0..=1.0).contains(&tolerance) {
                return Err(CoreError::Configuration(format!(
                    "nutrient {:?} has tolerance {tolerance} outside [0, 1]",
                    self.data_key
                )));
            }
        }

        let mut rules: Vec<Box<dyn Rule>> = Vec::new();
        if self.day_rules_enabled() {
            let day_band = self.band.widened(self.tolerance_min, self.tolerance_max);
            for (day, slot_ids) in &plan.slot_ids_per_day {
                rules.push(Box::new(IntervalRule {
                    label: format!("{} / day {day}", self.data_key),
                    constraint_key: self.data_key.clone(),
                    data_key: self.data_key.clone(),
                    band: day_band,
                    slot_ids: slot_ids.clone(),
                    cost_per_percent_out: self.cost_per_percent_out,
                }));
            }
        }
        if self.weekly_rule {
            // Half weight: day balance takes priority over the week average.
            let nb_days = plan.nb_days() as f64;
            rules.push(Box::new(IntervalRule {
                label: format!("{} / week", self.data_key),
                constraint_key: self.data_key.clone(),
                data_key: self.data_key.clone(),
                band: self.band.scaled(nb_days),
                slot_ids: plan.all_slot_ids().to_vec(),
                cost_per_percent_out: self.cost_per_percent_out / 2.0,
            }));
        }
        Ok(rules)
    }
}
