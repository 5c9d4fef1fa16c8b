//! Weekly plan model: dish slots and the derived plan index.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::{DayId, DishTypeId, MealId, MealTypeId, RecipeId, SlotId};

/// Lock state of a dish slot.
///
/// Anything other than `Free` is off-limits for the optimizer: the slot is
/// copied verbatim into every candidate solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// The optimizer may assign or replace recipes.
    Free,
    /// The user confirmed the current assignment.
    Validated,
    /// The user forced a specific recipe in.
    UserForced,
    /// The meal is eaten outside; no recipe is needed.
    ExternallyEaten,
    /// The slot was skipped; no recipe is needed.
    Skipped,
}

impl LockState {
    /// Whether the optimizer may change this slot.
    #[inline]
    pub fn is_mutable(self) -> bool {
        matches!(self, LockState::Free)
    }
}

/// A single recipe-assignment position inside a meal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishSlot {
    pub id: SlotId,
    pub day: DayId,
    pub meal: MealId,
    pub meal_type: MealTypeId,
    pub dish_type: DishTypeId,
    pub lock: LockState,
    /// Optional slots may stay empty without penalty.
    pub optional: bool,
    /// Current assignment as stored: (recipe, portion ratio) pairs.
    pub assigned: Vec<(RecipeId, f64)>,
}

impl DishSlot {
    pub fn new(
        id: SlotId,
        day: DayId,
        meal: MealId,
        meal_type: MealTypeId,
        dish_type: DishTypeId,
    ) -> Self {
        DishSlot {
            id,
            day,
            meal,
            meal_type,
            dish_type,
            lock: LockState::Free,
            optional: false,
            assigned: Vec::new(),
        }
    }

    pub fn locked(mut self, lock: LockState) -> Self {
        self.lock = lock;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_assigned(mut self, recipe: RecipeId, ratio: f64) -> Self {
        self.assigned.push((recipe, ratio));
        self
    }

    /// Whether any returned solution must carry a recipe for this slot.
    #[inline]
    pub fn requires_assignment(&self) -> bool {
        !self.optional
            && !matches!(self.lock, LockState::ExternallyEaten | LockState::Skipped)
    }

    #[inline]
    pub fn is_mutable(&self) -> bool {
        self.lock.is_mutable()
    }
}

/// Read-only snapshot of the plan structure with derived lookup maps.
///
/// Built once per optimization request; constraints compile their rules
/// against these maps.
#[derive(Debug, Clone)]
pub struct PlanIndex {
    slots: BTreeMap<SlotId, DishSlot>,
    pub slot_ids_per_day: BTreeMap<DayId, Vec<SlotId>>,
    pub slot_ids_per_meal: BTreeMap<MealId, Vec<SlotId>>,
    pub slot_ids_per_dish_type: BTreeMap<DishTypeId, Vec<SlotId>>,
    pub meal_ids_per_meal_type: BTreeMap<MealTypeId, Vec<MealId>>,
    pub meal_day: BTreeMap<MealId, DayId>,
    /// Meals entirely eaten outside; excluded from meal-to-meal balancing.
    pub external_meal_ids: BTreeSet<MealId>,
    all_slot_ids: Vec<SlotId>,
    mutable_slot_ids: Vec<SlotId>,
}

impl PlanIndex {
    /// Builds the index from the slot snapshot.
    ///
    /// Fails with `Configuration` on duplicate slot ids or a locked slot
    /// that requires an assignment but carries none.
    pub fn new(slot_list: Vec<DishSlot>) -> Result<Self> {
        let mut slots = BTreeMap::new();
        let mut slot_ids_per_day: BTreeMap<DayId, Vec<SlotId>> = BTreeMap::new();
        let mut slot_ids_per_meal: BTreeMap<MealId, Vec<SlotId>> = BTreeMap::new();
        let mut slot_ids_per_dish_type: BTreeMap<DishTypeId, Vec<SlotId>> = BTreeMap::new();
        let mut meal_ids_per_meal_type: BTreeMap<MealTypeId, Vec<MealId>> = BTreeMap::new();
        let mut meal_day = BTreeMap::new();
        let mut all_slot_ids = Vec::new();
        let mut mutable_slot_ids = Vec::new();

        for slot in slot_list {
            if !slot.is_mutable() && slot.requires_assignment() && slot.assigned.is_empty() {
                return Err(CoreError::Configuration(format!(
                    "locked slot {} requires an assignment but has none",
                    slot.id
                )));
            }
            if slots.contains_key(&slot.id) {
                return Err(CoreError::Configuration(format!(
                    "duplicate slot id {}",
                    slot.id
                )));
            }
            slot_ids_per_day.entry(slot.day).or_default().push(slot.id);
            slot_ids_per_meal.entry(slot.meal).or_default().push(slot.id);
            slot_ids_per_dish_type
                .entry(slot.dish_type)
                .or_default()
                .push(slot.id);
            let meals = meal_ids_per_meal_type.entry(slot.meal_type).or_default();
            if !meals.contains(&slot.meal) {
                meals.push(slot.meal);
            }
            meal_day.insert(slot.meal, slot.day);
            all_slot_ids.push(slot.id);
            if slot.is_mutable() && slot.requires_assignment() {
                mutable_slot_ids.push(slot.id);
            }
            slots.insert(slot.id, slot);
        }

        let external_meal_ids = slot_ids_per_meal
            .iter()
            .filter(|(_, ids)| {
                ids.iter().all(|id| {
                    matches!(slots[id].lock, LockState::ExternallyEaten)
                })
            })
            .map(|(meal, _)| *meal)
            .collect();

        Ok(PlanIndex {
            slots,
            slot_ids_per_day,
            slot_ids_per_meal,
            slot_ids_per_dish_type,
            meal_ids_per_meal_type,
            meal_day,
            external_meal_ids,
            all_slot_ids,
            mutable_slot_ids,
        })
    }

    pub fn slot(&self, id: SlotId) -> Option<&DishSlot> {
        self.slots.get(&id)
    }

    pub fn slots(&self) -> impl Iterator<Item = &DishSlot> {
        self.slots.values()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn nb_days(&self) -> usize {
        self.slot_ids_per_day.len()
    }

    /// Every slot id of the plan, in insertion order.
    pub fn all_slot_ids(&self) -> &[SlotId] {
        &self.all_slot_ids
    }

    /// Slots the optimizer may touch: free lock and an assignment required.
    pub fn mutable_slot_ids(&self) -> &[SlotId] {
        &self.mutable_slot_ids
    }

    pub fn is_mutable(&self, id: SlotId) -> bool {
        self.mutable_slot_ids.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: i64, day: i64, meal: i64) -> DishSlot {
        DishSlot::new(
            SlotId(id),
            DayId(day),
            MealId(meal),
            MealTypeId(meal % 10),
            DishTypeId(1),
        )
    }

    #[test]
    fn derived_maps_cover_all_slots() {
        let plan = PlanIndex::new(vec![
            slot(1, 1, 11),
            slot(2, 1, 11),
            slot(3, 2, 21),
        ])
        .unwrap();
        assert_eq!(plan.nb_days(), 2);
        assert_eq!(plan.slot_ids_per_day[&DayId(1)].len(), 2);
        assert_eq!(plan.meal_day[&MealId(21)], DayId(2));
        assert_eq!(plan.mutable_slot_ids().len(), 3);
    }

    #[test]
    fn locked_slots_are_not_mutable() {
        let plan = PlanIndex::new(vec![
            slot(1, 1, 11).locked(LockState::Validated).with_assigned(RecipeId(5), 1.0),
            slot(2, 1, 11),
            slot(3, 1, 12).locked(LockState::Skipped),
        ])
        .unwrap();
        assert_eq!(plan.mutable_slot_ids(), &[SlotId(2)]);
        assert!(!plan.slot(SlotId(3)).unwrap().requires_assignment());
    }

    #[test]
    fn locked_slot_without_assignment_is_rejected() {
        let err = PlanIndex::new(vec![slot(1, 1, 11).locked(LockState::UserForced)]).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn fully_external_meals_are_flagged() {
        let plan = PlanIndex::new(vec![
            slot(1, 1, 11).locked(LockState::ExternallyEaten),
            slot(2, 1, 12),
        ])
        .unwrap();
        assert!(plan.external_meal_ids.contains(&MealId(11)));
        assert!(!plan.external_meal_ids.contains(&MealId(12)));
    }
}
