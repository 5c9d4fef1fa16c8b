//! Candidate solutions: slot -> portioned recipe lists.

use std::collections::BTreeMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::ids::{RecipeId, SlotId};
use crate::recipe::RecipeRecord;

/// Degenerate-ratio floor: portions below this are not realistic servings.
pub const MIN_RATIO: f64 = 0.2;

/// One recipe serving inside a slot.
#[derive(Debug, Clone)]
pub struct Portion {
    pub recipe: Arc<RecipeRecord>,
    pub ratio: f64,
}

impl Portion {
    pub fn new(recipe: Arc<RecipeRecord>, ratio: f64) -> Self {
        Portion {
            recipe,
            ratio: ratio.max(MIN_RATIO),
        }
    }
}

/// Slots nearly always hold one recipe, occasionally two (aggregated dishes).
pub type PortionList = SmallVec<[Portion; 2]>;

/// A full assignment of recipes to dish slots.
///
/// Short-lived: produced by one solver call, consumed by the evaluator or
/// the result writer. Locked slots are carried verbatim from the baseline.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    assignments: BTreeMap<SlotId, PortionList>,
}

impl Solution {
    pub fn new() -> Self {
        Solution::default()
    }

    /// Replaces the whole portion list of a slot.
    pub fn set(&mut self, slot: SlotId, portions: impl IntoIterator<Item = Portion>) {
        self.assignments.insert(slot, portions.into_iter().collect());
    }

    /// Replaces one slot with a single full portion of `recipe`.
    pub fn set_single(&mut self, slot: SlotId, recipe: Arc<RecipeRecord>, ratio: f64) {
        let mut list = PortionList::new();
        list.push(Portion::new(recipe, ratio));
        self.assignments.insert(slot, list);
    }

    pub fn portions(&self, slot: SlotId) -> &[Portion] {
        self.assignments.get(&slot).map(|l| l.as_slice()).unwrap_or(&[])
    }

    pub fn has_assignment(&self, slot: SlotId) -> bool {
        !self.portions(slot).is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &[Portion])> {
        self.assignments.iter().map(|(id, l)| (*id, l.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Sum of `key` over one slot, portion ratios applied.
    #[inline]
    pub fn slot_data(&self, slot: SlotId, key: &str) -> f64 {
        self.portions(slot)
            .iter()
            .map(|p| p.recipe.data(key, p.ratio))
            .sum()
    }

    /// Sum of `key` over a set of slots.
    #[inline]
    pub fn total_over(&self, slots: &[SlotId], key: &str) -> f64 {
        slots.iter().map(|s| self.slot_data(*s, key)).sum()
    }

    /// Recipe ids assigned to a slot, in order.
    pub fn recipe_ids(&self, slot: SlotId) -> impl Iterator<Item = RecipeId> + '_ {
        self.portions(slot).iter().map(|p| p.recipe.id)
    }

    /// Whether two solutions assign the same recipes (ids, in order) to a
    /// slot. Ratios are not part of the comparison: a re-portioned dish is
    /// still the same dish.
    pub fn same_assignment(&self, other: &Solution, slot: SlotId) -> bool {
        self.recipe_ids(slot).eq(other.recipe_ids(slot))
    }

    /// Number of slots whose assignment differs from `baseline`.
    pub fn diff_count(&self, baseline: &Solution, slots: &[SlotId]) -> usize {
        slots
            .iter()
            .filter(|s| !self.same_assignment(baseline, **s))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: i64) -> Arc<RecipeRecord> {
        Arc::new(RecipeRecord::new(RecipeId(id), format!("r{id}")).with_data("kcal", 100.0))
    }

    #[test]
    fn ratio_floor_is_enforced() {
        let mut s = Solution::new();
        s.set_single(SlotId(1), recipe(1), 0.05);
        assert_eq!(s.portions(SlotId(1))[0].ratio, MIN_RATIO);
    }

    #[test]
    fn slot_data_applies_ratios() {
        let mut s = Solution::new();
        s.set_single(SlotId(1), recipe(1), 0.5);
        assert_eq!(s.slot_data(SlotId(1), "kcal"), 50.0);
        assert_eq!(s.slot_data(SlotId(1), "missing"), 0.0);
    }

    #[test]
    fn diff_count_ignores_ratio_changes() {
        let mut a = Solution::new();
        let mut b = Solution::new();
        a.set_single(SlotId(1), recipe(1), 1.0);
        b.set_single(SlotId(1), recipe(1), 0.5);
        a.set_single(SlotId(2), recipe(2), 1.0);
        b.set_single(SlotId(2), recipe(3), 1.0);
        let slots = [SlotId(1), SlotId(2)];
        assert_eq!(a.diff_count(&b, &slots), 1);
    }
}
