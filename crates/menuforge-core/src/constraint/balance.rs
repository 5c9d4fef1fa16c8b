//! Balance constraints: nutrient-to-referent ratios and meal regularity.

use crate::error::{CoreError, Result};
use crate::ids::SlotId;
use crate::plan::PlanIndex;
use crate::score::{BandFlag, Indicator};
use crate::solution::Solution;

use super::{Constraint, Rule};

fn validate_ratio_band(key: &str, min_ratio: f64, max_ratio: f64) -> Result<()> {
    if !(min_ratio > 0.0) || !(max_ratio > 0.0) || min_ratio > max_ratio {
        return Err(CoreError::Configuration(format!(
            "balance on {key:?} has an invalid ratio band [{min_ratio}, {max_ratio}]"
        )));
    }
    Ok(())
}

/// Keeps the ratio of one data key to a referent key inside a band, per day
/// or per meal (e.g. keep added sugars proportional to total carbs).
#[derive(Debug, Clone)]
pub struct NutrientBalanceConstraint {
    data_key: String,
    referent_key: String,
    min_ratio: f64,
    max_ratio: f64,
    cost_per_percent_out: f64,
    max_penalty: f64,
    per_meal: bool,
}

impl NutrientBalanceConstraint {
    pub fn new(data_key: impl Into<String>, referent_key: impl Into<String>) -> Self {
        NutrientBalanceConstraint {
            data_key: data_key.into(),
            referent_key: referent_key.into(),
            min_ratio: 0.90,
            max_ratio: 1.10,
            cost_per_percent_out: 100.0,
            max_penalty: 10_000.0,
            per_meal: false,
        }
    }

    pub fn with_ratio_band(mut self, min_ratio: f64, max_ratio: f64) -> Self {
        self.min_ratio = min_ratio;
        self.max_ratio = max_ratio;
        self
    }

    pub fn with_cost_per_percent_out(mut self, cost: f64) -> Self {
        self.cost_per_percent_out = cost;
        self
    }

    pub fn with_max_penalty(mut self, penalty: f64) -> Self {
        self.max_penalty = penalty;
        self
    }

    /// Aggregate per meal instead of per day.
    pub fn per_meal(mut self) -> Self {
        self.per_meal = true;
        self
    }
}

impl Constraint for NutrientBalanceConstraint {
    fn key(&self) -> &str {
        &self.data_key
    }

    fn compile(&self, plan: &PlanIndex) -> Result<Vec<Box<dyn Rule>>> {
        validate_ratio_band(&self.data_key, self.min_ratio, self.max_ratio)?;
        let scopes: Vec<(String, Vec<SlotId>)> = if self.per_meal {
            plan.slot_ids_per_meal
                .iter()
                .map(|(meal, ids)| (format!("meal {meal}"), ids.clone()))
                .collect()
        } else {
            plan.slot_ids_per_day
                .iter()
                .map(|(day, ids)| (format!("day {day}"), ids.clone()))
                .collect()
        };
        Ok(scopes
            .into_iter()
            .map(|(scope, slot_ids)| {
                Box::new(BalanceRule {
                    label: format!("{}/{} / {scope}", self.data_key, self.referent_key),
                    spec: self.clone(),
                    slot_ids,
                }) as Box<dyn Rule>
            })
            .collect())
    }
}

#[derive(Debug)]
struct BalanceRule {
    label: String,
    spec: NutrientBalanceConstraint,
    slot_ids: Vec<SlotId>,
}

impl BalanceRule {
    fn ratio(&self, solution: &Solution) -> Option<f64> {
        let nutrient = solution.total_over(&self.slot_ids, &self.spec.data_key);
        let referent = solution.total_over(&self.slot_ids, &self.spec.referent_key);
        (nutrient > 0.0 && referent > 0.0).then(|| nutrient / referent)
    }
}

impl Rule for BalanceRule {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn constraint_key(&self) -> &str {
        &self.spec.data_key
    }

    fn slot_ids(&self) -> &[SlotId] {
        &self.slot_ids
    }

    fn cost(&self, solution: &Solution) -> f64 {
        let Some(ratio) = self.ratio(solution) else {
            return self.spec.max_penalty;
        };
        if ratio > self.spec.max_ratio {
            100.0 * self.spec.cost_per_percent_out * (ratio - self.spec.max_ratio)
        } else if ratio < self.spec.min_ratio {
            100.0 * self.spec.cost_per_percent_out * (self.spec.min_ratio - ratio)
        } else {
            0.0
        }
    }

    fn indicator(&self, solution: &Solution) -> Indicator {
        let ratio = self.ratio(solution);
        let cost = self.cost(solution);
        let flag = match ratio {
            Some(r) if r > self.spec.max_ratio => BandFlag::Over,
            Some(r) if r < self.spec.min_ratio => BandFlag::Under,
            Some(_) => BandFlag::Ok,
            None => BandFlag::Under,
        };
        Indicator {
            key: self.label.clone(),
            cost,
            min: Some(self.spec.min_ratio),
            max: Some(self.spec.max_ratio),
            value: ratio,
            percent_out: match ratio {
                Some(r) if r > self.spec.max_ratio => 100.0 * (r - self.spec.max_ratio),
                Some(r) if r < self.spec.min_ratio => 100.0 * (self.spec.min_ratio - r),
                _ => 0.0,
            },
            flag,
        }
    }
}

/// Keeps one nutrient steady across all meals sharing a meal type (every
/// lunch of the week should carry roughly the same energy).
#[derive(Debug, Clone)]
pub struct MealTypeBalanceConstraint {
    data_key: String,
    min_ratio: f64,
    max_ratio: f64,
    cost_per_percent_out: f64,
    max_penalty: f64,
}

impl MealTypeBalanceConstraint {
    pub fn new(data_key: impl Into<String>) -> Self {
        MealTypeBalanceConstraint {
            data_key: data_key.into(),
            min_ratio: 0.90,
            max_ratio: 1.10,
            cost_per_percent_out: 100.0,
            max_penalty: 10_000.0,
        }
    }

    pub fn with_ratio_band(mut self, min_ratio: f64, max_ratio: f64) -> Self {
        self.min_ratio = min_ratio;
        self.max_ratio = max_ratio;
        self
    }

    pub fn with_cost_per_percent_out(mut self, cost: f64) -> Self {
        self.cost_per_percent_out = cost;
        self
    }
}

impl Constraint for MealTypeBalanceConstraint {
    fn key(&self) -> &str {
        &self.data_key
    }

    fn compile(&self, plan: &PlanIndex) -> Result<Vec<Box<dyn Rule>>> {
        validate_ratio_band(&self.data_key, self.min_ratio, self.max_ratio)?;
        let mut rules: Vec<Box<dyn Rule>> = Vec::new();
        for (meal_type, meal_ids) in &plan.meal_ids_per_meal_type {
            // Eaten-out meals carry no recipes and must not look like gaps.
            let meals: Vec<Vec<SlotId>> = meal_ids
                .iter()
                .filter(|meal| !plan.external_meal_ids.contains(meal))
                .filter_map(|meal| plan.slot_ids_per_meal.get(meal).cloned())
                .collect();
            if meals.len() < 2 {
                continue;
            }
            let slot_ids = meals.iter().flatten().copied().collect();
            rules.push(Box::new(MealTypeBalanceRule {
                label: format!("{} / meal type {meal_type}", self.data_key),
                spec: self.clone(),
                meals,
                slot_ids,
            }));
        }
        Ok(rules)
    }
}

#[derive(Debug)]
struct MealTypeBalanceRule {
    label: String,
    spec: MealTypeBalanceConstraint,
    meals: Vec<Vec<SlotId>>,
    slot_ids: Vec<SlotId>,
}

impl Rule for MealTypeBalanceRule {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn constraint_key(&self) -> &str {
        &self.spec.data_key
    }

    fn slot_ids(&self) -> &[SlotId] {
        &self.slot_ids
    }

    fn cost(&self, solution: &Solution) -> f64 {
        let weight = 100.0 * self.spec.cost_per_percent_out;
        let mut drift = 0.0;
        let mut previous: Option<f64> = None;
        for slots in &self.meals {
            let current = solution.total_over(slots, &self.spec.data_key);
            match previous {
                None => {}
                Some(prev) if prev > 0.0 && current > 0.0 => {
                    let ratio = current / prev;
                    if ratio > self.spec.max_ratio {
                        drift += ratio - self.spec.max_ratio;
                    } else if ratio < self.spec.min_ratio {
                        drift += self.spec.min_ratio - ratio;
                    }
                }
                // One of the meals carries nothing at all.
                Some(_) => drift += self.spec.max_penalty / weight,
            }
            previous = Some(current);
        }
        weight * drift
    }
}
