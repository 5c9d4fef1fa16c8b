//! Problem assembly: plan + catalog + constraints, compiled once per solve.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use menuforge_core::constraint::{Band, MaxModifsConstraint, NutrientConstraint, UnicityConstraint};
use menuforge_core::recipe::data_keys;
use menuforge_core::{
    Constraint, ConstraintSet, CoreError, PlanIndex, Portion, RecipeIndex, Result, SlotId, Solution,
};

use crate::candidates::{CandidateSet, RecipeFilter};
use crate::diet::{DietConstraintSource, ProfileContext};
use crate::eval::Evaluator;
use crate::solve::PlannerRng;

const DEFAULT_UNICITY_WEIGHT: f64 = 100.0;
const DEFAULT_MODIF_COST: f64 = 1000.0;

/// Assembles a [`Problem`] from the plan snapshot, the catalog index, the
/// diet-supplied constraints and the structural ones the planner always
/// injects.
pub struct ProblemBuilder {
    index: Arc<RecipeIndex>,
    plan: PlanIndex,
    constraints: Vec<Box<dyn Constraint>>,
    filters: Vec<Box<dyn RecipeFilter>>,
    seed_from_existing: bool,
    change_budget: Option<(usize, f64)>,
    time_limit: Option<Duration>,
    unicity_weight: f64,
    daily_budget: Option<Band>,
    daily_prep_minutes: Option<Band>,
}

impl ProblemBuilder {
    pub fn new(index: Arc<RecipeIndex>, plan: PlanIndex) -> Self {
        ProblemBuilder {
            index,
            plan,
            constraints: Vec::new(),
            filters: Vec::new(),
            seed_from_existing: false,
            change_budget: None,
            time_limit: None,
            unicity_weight: DEFAULT_UNICITY_WEIGHT,
            daily_budget: None,
            daily_prep_minutes: None,
        }
    }

    pub fn with_constraint(mut self, constraint: Box<dyn Constraint>) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Appends the constraints a diet source derives from the profile.
    pub fn with_diet(
        mut self,
        source: &dyn DietConstraintSource,
        context: &ProfileContext,
    ) -> Result<Self> {
        self.constraints.extend(source.constraints(context)?);
        Ok(self)
    }

    pub fn with_filter(mut self, filter: Box<dyn RecipeFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Keeps the current assignments as the starting point instead of
    /// randomizing mutable slots.
    pub fn seed_from_existing(mut self) -> Self {
        self.seed_from_existing = true;
        self
    }

    /// Caps changes against the baseline: `max_modifs` free, then
    /// `cost_per_modif` each.
    pub fn with_change_budget(mut self, max_modifs: usize, cost_per_modif: f64) -> Self {
        self.change_budget = Some((max_modifs, cost_per_modif));
        self
    }

    /// Change budget with the standard per-change cost.
    pub fn with_max_modifs(self, max_modifs: usize) -> Self {
        self.with_change_budget(max_modifs, DEFAULT_MODIF_COST)
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_unicity_weight(mut self, weight: f64) -> Self {
        self.unicity_weight = weight;
        self
    }

    /// Daily price band, in the catalog's currency unit.
    pub fn with_daily_budget(mut self, band: Band) -> Self {
        self.daily_budget = Some(band);
        self
    }

    /// Daily preparation-time band, in minutes.
    pub fn with_daily_prep_minutes(mut self, band: Band) -> Self {
        self.daily_prep_minutes = Some(band);
        self
    }

    /// Computes candidate sets, the baseline solution and the compiled rule
    /// set. Fails with `NoCandidates` when a required slot filters down to
    /// nothing; no partial plan is ever produced.
    pub fn build(mut self, rng: &mut PlannerRng) -> Result<Problem> {
        let candidates = self.build_candidates()?;
        let baseline = Arc::new(self.build_baseline(&candidates, rng)?);

        let dish_types: Vec<_> = self.plan.slot_ids_per_dish_type.keys().copied().collect();
        self.constraints.push(Box::new(UnicityConstraint::new(
            self.unicity_weight,
            dish_types,
        )));
        if let Some(band) = self.daily_budget {
            self.constraints
                .push(Box::new(NutrientConstraint::new(data_keys::PRICE, band)));
        }
        if let Some(band) = self.daily_prep_minutes {
            self.constraints.push(Box::new(NutrientConstraint::new(
                data_keys::PREP_MINUTES,
                band,
            )));
        }
        if let Some((max_modifs, cost_per_modif)) = self.change_budget {
            self.constraints.push(Box::new(MaxModifsConstraint::new(
                Arc::clone(&baseline),
                max_modifs,
                cost_per_modif,
            )));
        }

        let constraints = ConstraintSet::compile(&self.constraints, &self.plan)?;
        info!(
            slots = self.plan.len(),
            mutable = self.plan.mutable_slot_ids().len(),
            rules = constraints.len(),
            "problem built"
        );
        Ok(Problem {
            index: self.index,
            plan: self.plan,
            candidates,
            baseline,
            constraints,
            time_limit: self.time_limit,
            seed_from_existing: self.seed_from_existing,
        })
    }

    /// Dish-type compatibility first, then every hard filter.
    fn build_candidates(&self) -> Result<HashMap<SlotId, CandidateSet>> {
        if self.index.is_empty() {
            return Err(CoreError::EmptyIndex {
                key: "catalog".to_owned(),
            });
        }
        let mut candidates = HashMap::new();
        for slot_id in self.plan.mutable_slot_ids() {
            let slot = self
                .plan
                .slot(*slot_id)
                .ok_or_else(|| CoreError::Configuration(format!("unknown slot {slot_id}")))?;
            let eligible: Vec<_> = self
                .index
                .records()
                .filter(|r| r.suits(slot.dish_type))
                .filter(|r| self.filters.iter().all(|f| f.accepts(r)))
                .cloned()
                .collect();
            if eligible.is_empty() {
                debug!(slot = %slot_id, dish_type = %slot.dish_type, "no eligible recipe");
                return Err(CoreError::NoCandidates { slot: *slot_id });
            }
            candidates.insert(*slot_id, CandidateSet::build(eligible));
        }
        Ok(candidates)
    }

    /// Locked and optional assignments verbatim; mutable required slots keep
    /// their stored recipes when seeding from existing (and still eligible),
    /// else a uniform draw.
    fn build_baseline(
        &self,
        candidates: &HashMap<SlotId, CandidateSet>,
        rng: &mut PlannerRng,
    ) -> Result<Solution> {
        let mut baseline = Solution::new();
        for slot in self.plan.slots() {
            // Only mutable required slots have a candidate set. Everything
            // else (locked, optional, skipped) is outside the search and
            // carries whatever is stored, so a persist never erases it.
            let Some(set) = candidates.get(&slot.id) else {
                if slot.assigned.is_empty() {
                    continue;
                }
                let mut portions = Vec::with_capacity(slot.assigned.len());
                for (recipe, ratio) in &slot.assigned {
                    portions.push(Portion::new(Arc::clone(self.index.get(*recipe)?), *ratio));
                }
                baseline.set(slot.id, portions);
                continue;
            };
            let mut kept = self.seed_from_existing && !slot.assigned.is_empty();
            let mut portions = Vec::with_capacity(slot.assigned.len());
            if kept {
                for (recipe, ratio) in &slot.assigned {
                    // A stored recipe the filters now reject drops the whole
                    // slot back to a fresh draw.
                    match set.get(*recipe) {
                        Some(record) => portions.push(Portion::new(Arc::clone(record), *ratio)),
                        None => {
                            kept = false;
                            break;
                        }
                    }
                }
            }
            if kept {
                baseline.set(slot.id, portions);
            } else {
                baseline.set_single(slot.id, Arc::clone(set.sample_uniform(rng)), 1.0);
            }
        }
        Ok(baseline)
    }
}

/// One compiled optimization request: immutable for the whole solve.
pub struct Problem {
    index: Arc<RecipeIndex>,
    plan: PlanIndex,
    candidates: HashMap<SlotId, CandidateSet>,
    baseline: Arc<Solution>,
    constraints: ConstraintSet,
    time_limit: Option<Duration>,
    seed_from_existing: bool,
}

impl Problem {
    pub fn plan(&self) -> &PlanIndex {
        &self.plan
    }

    pub fn index(&self) -> &Arc<RecipeIndex> {
        &self.index
    }

    /// Candidate set of a mutable required slot.
    pub fn candidates(&self, slot: SlotId) -> Option<&CandidateSet> {
        self.candidates.get(&slot)
    }

    pub fn baseline(&self) -> &Arc<Solution> {
        &self.baseline
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.constraints)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn seed_from_existing(&self) -> bool {
        self.seed_from_existing
    }
}

impl std::fmt::Debug for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Problem")
            .field("slots", &self.plan.len())
            .field("mutable", &self.plan.mutable_slot_ids().len())
            .field("rules", &self.constraints.len())
            .finish()
    }
}
