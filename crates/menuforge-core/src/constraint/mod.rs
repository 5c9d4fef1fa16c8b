//! Soft constraints over aggregated nutrient/attribute totals.
//!
//! Two-level design: a [`Constraint`] holds configuration and compiles into
//! one or more [`Rule`]s, each bound to the concrete slot ids of one scope
//! (a day, a meal, the week). The solver works exclusively on the compiled
//! [`ConstraintSet`]: rules carry the slot spans used by crossover, the
//! sampling guidance used by oriented mutation, and the indicator rows
//! shown to users.

mod balance;
mod interval;
mod max_modifs;
mod nutrient;
mod unicity;


use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

use crate::error::Result;
use crate::ids::SlotId;
use crate::plan::PlanIndex;
use crate::score::{BandFlag, Indicator, Score};
use crate::solution::Solution;

pub use balance::{MealTypeBalanceConstraint, NutrientBalanceConstraint};
pub use interval::{Band, IntervalRule};
pub use max_modifs::MaxModifsConstraint;
pub use nutrient::NutrientConstraint;
pub use unicity::UnicityConstraint;

/// Sampling hint for oriented mutation: which data key drives a rule and
/// which per-slot value would bring the rule back on target.
#[derive(Debug, Clone)]
pub struct Guidance {
    pub data_key: String,
    pub target: f64,
}

/// A scoped, stateless cost function bound to concrete slot ids.
pub trait Rule: Debug + Send + Sync {
    /// Human-readable label, unique within a compiled set in practice.
    fn label(&self) -> String;

    /// Key of the constraint this rule was compiled from.
    fn constraint_key(&self) -> &str;

    /// Slots whose assignments influence this rule's cost.
    fn slot_ids(&self) -> &[SlotId];

    /// Cost of the solution under this rule. Always >= 0; exactly 0 when
    /// the rule is satisfied.
    fn cost(&self, solution: &Solution) -> f64;

    /// Per-slot sampling target for oriented mutation, when the rule has a
    /// meaningful numeric driver.
    fn guidance(&self, _solution: &Solution, _slot: SlotId) -> Option<Guidance> {
        None
    }

    /// User-facing indicator row. The default carries the cost only.
    fn indicator(&self, solution: &Solution) -> Indicator {
        let cost = self.cost(solution);
        Indicator {
            key: self.label(),
            cost,
            min: None,
            max: None,
            value: None,
            percent_out: 0.0,
            flag: if cost == 0.0 { BandFlag::Ok } else { BandFlag::Over },
        }
    }
}

/// Configured constraint, compiled against a plan into scoped rules.
pub trait Constraint: Debug + Send + Sync {
    fn key(&self) -> &str;

    /// Validates the configuration and produces the scoped rules.
    fn compile(&self, plan: &PlanIndex) -> Result<Vec<Box<dyn Rule>>>;
}

/// The compiled, flattened rule set for one Problem.
#[derive(Debug)]
pub struct ConstraintSet {
    rules: Vec<Box<dyn Rule>>,
    rules_by_slot: HashMap<SlotId, Vec<usize>>,
}

impl ConstraintSet {
    /// Compiles every constraint against the plan. Fails fast on the first
    /// malformed constraint.
    pub fn compile(constraints: &[Box<dyn Constraint>], plan: &PlanIndex) -> Result<Self> {
        let mut rules = Vec::new();
        for constraint in constraints {
            rules.extend(constraint.compile(plan)?);
        }
        let mut rules_by_slot: HashMap<SlotId, Vec<usize>> = HashMap::new();
        for (index, rule) in rules.iter().enumerate() {
            for slot in rule.slot_ids() {
                rules_by_slot.entry(*slot).or_default().push(index);
            }
        }
        Ok(ConstraintSet { rules, rules_by_slot })
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Indices of the rules influenced by a slot.
    pub fn rules_touching(&self, slot: SlotId) -> &[usize] {
        self.rules_by_slot.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Full evaluation: total plus itemized costs, zero entries included.
    pub fn evaluate(&self, solution: &Solution) -> Score {
        Score::new(self.rules.iter().map(|r| r.cost(solution)).collect())
    }

    /// Incremental re-evaluation: only rules touching a changed slot are
    /// recomputed, the rest is carried over from `base`.
    pub fn rescore(&self, base: &Score, solution: &Solution, changed: &[SlotId]) -> Score {
        let mut affected = BTreeSet::new();
        for slot in changed {
            affected.extend(self.rules_touching(*slot).iter().copied());
        }
        let mut score = base.clone();
        for index in affected {
            score = score.with_rule_cost(index, self.rules[index].cost(solution));
        }
        score
    }

    /// Cold-path breakdown: one indicator row per rule.
    pub fn indicators(&self, solution: &Solution) -> Vec<Indicator> {
        self.rules.iter().map(|r| r.indicator(solution)).collect()
    }
}
