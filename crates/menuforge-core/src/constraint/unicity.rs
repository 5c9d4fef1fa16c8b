//! Variety: penalize serving the same recipe several times.

use std::collections::BTreeSet;

use crate::error::{CoreError, Result};
use crate::ids::{DishTypeId, RecipeId, SlotId};
use crate::plan::PlanIndex;
use crate::solution::Solution;

use super::{Constraint, Rule};

/// Penalizes repeated recipes across slots of the given dish types, one
/// week-scope rule plus optional per-day rules for types that must also be
/// unique within a single day.
///
/// Internal recipes (placeholders, user's own dishes) never count.
#[derive(Debug, Clone)]
pub struct UnicityConstraint {
    weight: f64,
    week_dish_types: Vec<DishTypeId>,
    day_dish_types: Vec<DishTypeId>,
}

impl UnicityConstraint {
    pub fn new(weight: f64, week_dish_types: Vec<DishTypeId>) -> Self {
        UnicityConstraint {
            weight,
            week_dish_types,
            day_dish_types: Vec::new(),
        }
    }

    /// Dish types whose recipes must additionally be unique per day.
    pub fn with_daily(mut self, day_dish_types: Vec<DishTypeId>) -> Self {
        self.day_dish_types = day_dish_types;
        self
    }
}

impl Constraint for UnicityConstraint {
    fn key(&self) -> &str {
        "unicity"
    }

    fn compile(&self, plan: &PlanIndex) -> Result<Vec<Box<dyn Rule>>> {
        if !(self.weight > 0.0) {
            return Err(CoreError::Configuration(format!(
                "unicity weight must be positive, got {}",
                self.weight
            )));
        }
        let mut week_slots = BTreeSet::new();
        for dish_type in &self.week_dish_types {
            if let Some(ids) = plan.slot_ids_per_dish_type.get(dish_type) {
                week_slots.extend(ids.iter().copied());
            }
        }
        let mut rules: Vec<Box<dyn Rule>> = vec![Box::new(UnicityRule {
            label: "variety / week".to_owned(),
            slot_ids: week_slots.into_iter().collect(),
            weight: self.weight,
        })];

        if self.day_dish_types.is_empty() {
            return Ok(rules);
        }
        for (day, slot_ids) in &plan.slot_ids_per_day {
            let day_slots: Vec<SlotId> = slot_ids
                .iter()
                .filter(|id| {
                    plan.slot(**id)
                        .is_some_and(|s| self.day_dish_types.contains(&s.dish_type))
                })
                .copied()
                .collect();
            if day_slots.len() > 1 {
                rules.push(Box::new(UnicityRule {
                    label: format!("variety / day {day}"),
                    slot_ids: day_slots,
                    weight: self.weight,
                }));
            }
        }
        Ok(rules)
    }
}

#[derive(Debug)]
struct UnicityRule {
    label: String,
    slot_ids: Vec<SlotId>,
    weight: f64,
}

impl UnicityRule {
    /// Redundant repeats: served portions minus distinct recipes.
    fn redundancies(&self, solution: &Solution) -> usize {
        let mut unique: BTreeSet<RecipeId> = BTreeSet::new();
        let mut served = 0usize;
        for slot in &self.slot_ids {
            for portion in solution.portions(*slot) {
                if portion.recipe.internal {
                    continue;
                }
                served += 1;
                unique.insert(portion.recipe.id);
            }
        }
        served - unique.len()
    }
}

impl Rule for UnicityRule {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn constraint_key(&self) -> &str {
        "unicity"
    }

    fn slot_ids(&self) -> &[SlotId] {
        &self.slot_ids
    }

    fn cost(&self, solution: &Solution) -> f64 {
        self.redundancies(solution) as f64 * self.weight
    }
}
