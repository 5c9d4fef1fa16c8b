//! In-memory store used by tests and demos.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use menuforge_core::{DishSlot, RecipeId, RecipeRecord, SlotId, Solution};

use crate::{PlanStore, Result, ResultWriter, StoreError};

type AssignmentMap = BTreeMap<SlotId, Vec<(RecipeId, f64)>>;

/// Mutex-guarded plan + catalog with staged-swap persistence.
///
/// `persist` builds the complete replacement map before taking the lock and
/// swaps it in as one assignment, so a failure can never leave a half
/// written plan behind. The failure hook exists to prove exactly that in
/// tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<Vec<DishSlot>>,
    catalog: Mutex<Vec<RecipeRecord>>,
    assignments: Mutex<AssignmentMap>,
    fail_next_persist: AtomicBool,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MemoryStore {
    pub fn new(slots: Vec<DishSlot>, catalog: Vec<RecipeRecord>) -> Self {
        MemoryStore {
            slots: Mutex::new(slots),
            catalog: Mutex::new(catalog),
            assignments: Mutex::new(AssignmentMap::new()),
            fail_next_persist: AtomicBool::new(false),
        }
    }

    /// Makes the next `persist` fail after staging, before the swap.
    pub fn fail_next_persist(&self) {
        self.fail_next_persist.store(true, Ordering::SeqCst);
    }

    /// Stored slot -> (recipe, ratio) assignments.
    pub fn assignments(&self) -> AssignmentMap {
        locked(&self.assignments).clone()
    }

    pub fn replace_catalog(&self, catalog: Vec<RecipeRecord>) {
        *locked(&self.catalog) = catalog;
    }
}

impl PlanStore for MemoryStore {
    fn load_slots(&self) -> Result<Vec<DishSlot>> {
        Ok(locked(&self.slots).clone())
    }

    fn load_catalog(&self) -> Result<Vec<RecipeRecord>> {
        Ok(locked(&self.catalog).clone())
    }
}

impl ResultWriter for MemoryStore {
    fn persist(&self, solution: &Solution) -> Result<()> {
        // Stage the whole replacement first; the swap below is the only
        // state change.
        let staged: AssignmentMap = solution
            .slots()
            .map(|(slot, portions)| {
                let pairs = portions.iter().map(|p| (p.recipe.id, p.ratio)).collect();
                (slot, pairs)
            })
            .collect();

        if self.fail_next_persist.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected persist failure".into()));
        }

        let mut assignments = locked(&self.assignments);
        *assignments = staged;
        debug!(slots = assignments.len(), "assignments persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use menuforge_core::{DayId, DishTypeId, MealId, MealTypeId};

    use super::*;

    fn recipe(id: i64) -> Arc<RecipeRecord> {
        Arc::new(RecipeRecord::new(RecipeId(id), format!("r{id}")))
    }

    fn solution() -> Solution {
        let mut s = Solution::new();
        s.set_single(SlotId(1), recipe(10), 1.0);
        s.set_single(SlotId(2), recipe(20), 0.5);
        s
    }

    #[test]
    fn persist_then_reload_is_identity() {
        let store = MemoryStore::default();
        store.persist(&solution()).unwrap();
        let stored = store.assignments();
        assert_eq!(stored[&SlotId(1)], vec![(RecipeId(10), 1.0)]);
        assert_eq!(stored[&SlotId(2)], vec![(RecipeId(20), 0.5)]);
    }

    #[test]
    fn failed_persist_leaves_prior_state_untouched() {
        let store = MemoryStore::default();
        store.persist(&solution()).unwrap();
        let before = store.assignments();

        let mut next = Solution::new();
        next.set_single(SlotId(1), recipe(99), 1.0);
        store.fail_next_persist();
        assert!(matches!(
            store.persist(&next),
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.assignments(), before);

        // The failure hook is one-shot; the retry lands.
        store.persist(&next).unwrap();
        assert_eq!(store.assignments()[&SlotId(1)], vec![(RecipeId(99), 1.0)]);
    }

    #[test]
    fn loads_return_stored_snapshots() {
        let slot = DishSlot::new(
            SlotId(1),
            DayId(1),
            MealId(11),
            MealTypeId(1),
            DishTypeId(1),
        );
        let store = MemoryStore::new(vec![slot], vec![recipe(1).as_ref().clone()]);
        assert_eq!(store.load_slots().unwrap().len(), 1);
        assert_eq!(store.load_catalog().unwrap().len(), 1);
    }
}
