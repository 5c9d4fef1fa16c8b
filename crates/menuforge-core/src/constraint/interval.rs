//! Min/max bands over an aggregated data key.

use crate::error::{CoreError, Result};
use crate::ids::SlotId;
use crate::score::{BandFlag, Indicator};
use crate::solution::Solution;

use super::{Guidance, Rule};

/// An acceptance band. Either bound may be absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Band {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Band { min, max }
    }

    pub fn min_only(min: f64) -> Self {
        Band { min: Some(min), max: None }
    }

    pub fn max_only(max: f64) -> Self {
        Band { min: None, max: Some(max) }
    }

    pub fn validate(&self, key: &str) -> Result<()> {
        if self.min.is_none() && self.max.is_none() {
            return Err(CoreError::Configuration(format!(
                "band for {key:?} has neither min nor max"
            )));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(CoreError::Configuration(format!(
                    "band for {key:?} has min ({min}) > max ({max})"
                )));
            }
        }
        for bound in [self.min, self.max].into_iter().flatten() {
            if !(bound > 0.0) {
                return Err(CoreError::Configuration(format!(
                    "band for {key:?} has a non-positive bound ({bound})"
                )));
            }
        }
        Ok(())
    }

    /// Both bounds multiplied by `factor` (week-scope scaling).
    pub fn scaled(&self, factor: f64) -> Band {
        Band {
            min: self.min.map(|v| v * factor),
            max: self.max.map(|v| v * factor),
        }
    }

    /// Band widened by tolerance fractions: `[min·(1−tol_min), max·(1+tol_max)]`.
    pub fn widened(&self, tol_min: f64, tol_max: f64) -> Band {
        Band {
            min: self.min.map(|v| v * (1.0 - tol_min)),
            max: self.max.map(|v| v * (1.0 + tol_max)),
        }
    }

    /// Percent deviation below the min bound, 0 when inside.
    pub fn percent_under(&self, value: f64) -> f64 {
        match self.min {
            Some(min) if value < min => 100.0 * (min - value) / min,
            _ => 0.0,
        }
    }

    /// Percent deviation above the max bound, 0 when inside. When both
    /// bounds exist the excess is taken relative to the band width.
    pub fn percent_over(&self, value: f64) -> f64 {
        let Some(max) = self.max else { return 0.0 };
        if value <= max {
            return 0.0;
        }
        match self.min {
            Some(min) if min < max => 100.0 * (value - max) / (max - min),
            _ => 100.0 * (value - max) / max,
        }
    }

    /// Percent deviation outside the band and on which side.
    pub fn percent_out(&self, value: f64) -> (f64, BandFlag) {
        let under = self.percent_under(value);
        if under > 0.0 {
            return (under, BandFlag::Under);
        }
        let over = self.percent_over(value);
        if over > 0.0 {
            return (over, BandFlag::Over);
        }
        (0.0, BandFlag::Ok)
    }

    /// Value a rule steers towards: the band midpoint, or the single bound.
    pub fn target(&self) -> f64 {
        match (self.min, self.max) {
            (Some(min), Some(max)) => (min + max) / 2.0,
            (Some(min), None) => min,
            (None, Some(max)) => max,
            (None, None) => 0.0,
        }
    }
}

/// A band rule over the sum of one data key across a slot span, with
/// quadratic cost growth outside the band.
#[derive(Debug)]
pub struct IntervalRule {
    pub label: String,
    pub constraint_key: String,
    pub data_key: String,
    pub band: Band,
    pub slot_ids: Vec<SlotId>,
    pub cost_per_percent_out: f64,
}

impl IntervalRule {
    fn value(&self, solution: &Solution) -> f64 {
        solution.total_over(&self.slot_ids, &self.data_key)
    }
}

impl Rule for IntervalRule {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn constraint_key(&self) -> &str {
        &self.constraint_key
    }

    fn slot_ids(&self) -> &[SlotId] {
        &self.slot_ids
    }

    fn cost(&self, solution: &Solution) -> f64 {
        let (percent, _) = self.band.percent_out(self.value(solution));
        self.cost_per_percent_out * percent * percent
    }

    fn guidance(&self, solution: &Solution, slot: SlotId) -> Option<Guidance> {
        // Steer the slot towards the value that would put the whole span
        // back on the band target.
        let total = self.value(solution);
        let slot_now = solution.slot_data(slot, &self.data_key);
        let target = (slot_now + (self.band.target() - total)).max(0.0);
        Some(Guidance {
            data_key: self.data_key.clone(),
            target,
        })
    }

    fn indicator(&self, solution: &Solution) -> Indicator {
        let value = self.value(solution);
        let (percent_out, flag) = self.band.percent_out(value);
        Indicator {
            key: self.label.clone(),
            cost: self.cost_per_percent_out * percent_out * percent_out,
            min: self.band.min,
            max: self.band.max,
            value: Some(value),
            percent_out,
            flag,
        }
    }
}
