//! Recipe catalog index with weighted probabilistic sampling.
//!
//! The index is built once from a catalog snapshot and is immutable
//! afterwards; catalog refreshes swap a whole new index atomically through
//! [`SharedRecipeIndex`]. Sampling runs in O(log n) per draw: a value is
//! drawn from a Gaussian centered on the target, then the closest stored
//! value is located by binary search over the per-key sorted arrays.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{CoreError, Result};
use crate::ids::RecipeId;
use crate::recipe::RecipeRecord;

/// Gaussian width selector for [`RecipeIndex::sample_near`].
///
/// `Default` is a distinguished sentinel: the width is derived from the
/// catalog so the bell covers every stored value. It is not the same thing
/// as any explicit numeric width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spread {
    /// Derive sigma from the stored value range around the target.
    Default,
    /// Explicit sigma. Non-positive values fall back to the derived width.
    Explicit(f64),
}

/// One sorted sampling dimension: ascending values with their recipe ids.
#[derive(Debug, Clone, Default)]
pub struct SortedDim {
    values: Vec<f64>,
    recipes: Vec<RecipeId>,
}

impl SortedDim {
    /// Builds a dimension from unsorted (value, recipe) pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (f64, RecipeId)>) -> Self {
        let mut dim = SortedDim::default();
        for (value, recipe) in pairs {
            dim.push(value, recipe);
        }
        dim.sort();
        dim
    }

    fn push(&mut self, value: f64, recipe: RecipeId) {
        self.values.push(value);
        self.recipes.push(recipe);
    }

    fn sort(&mut self) {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| {
            self.values[a]
                .total_cmp(&self.values[b])
                .then(self.recipes[a].cmp(&self.recipes[b]))
        });
        self.values = order.iter().map(|&i| self.values[i]).collect();
        self.recipes = order.iter().map(|&i| self.recipes[i]).collect();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Ascending (value, recipe id) pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, RecipeId)> + '_ {
        self.values.iter().copied().zip(self.recipes.iter().copied())
    }

    fn sigma_for(&self, target: f64, spread: Spread) -> f64 {
        if let Spread::Explicit(v) = spread {
            if v > 0.0 {
                return v;
            }
        }
        // Wide enough to reach both ends of the stored range.
        let first = self.values[0];
        let last = self.values[self.values.len() - 1];
        (target - first).max(last - target).max(0.0)
    }

    /// Draws one recipe with Gaussian-shaped weight centered on `target`.
    ///
    /// Recipes sharing the same stored value receive identical weight: the
    /// whole span of equal values is located, then one entry is picked
    /// uniformly inside it.
    pub fn sample_near<R: Rng>(&self, target: f64, spread: Spread, rng: &mut R) -> RecipeId {
        debug_assert!(!self.is_empty());
        let sigma = self.sigma_for(target, spread);
        let drawn = match Normal::new(target, sigma) {
            Ok(normal) => normal.sample(rng),
            // Zero sigma: every stored value equals the target.
            Err(_) => target,
        };
        self.recipes[self.closest(drawn, rng)]
    }

    /// Index of the stored value closest to `wanted`, ties split uniformly.
    fn closest<R: Rng>(&self, wanted: f64, rng: &mut R) -> usize {
        let n = self.values.len();
        let mut i = self.values.partition_point(|v| *v < wanted);
        if i == n {
            i -= 1;
        } else if i > 0 && wanted - self.values[i - 1] < self.values[i] - wanted {
            i -= 1;
        }
        let mut lo = i;
        let mut hi = i;
        while hi + 1 < n && self.values[hi + 1] == self.values[i] {
            hi += 1;
        }
        while lo > 0 && self.values[lo - 1] == self.values[i] {
            lo -= 1;
        }
        if lo < hi {
            rng.random_range(lo..=hi)
        } else {
            i
        }
    }
}

/// Read-only catalog of recipes with per-key sampling dimensions.
#[derive(Debug, Default)]
pub struct RecipeIndex {
    recipes: HashMap<RecipeId, Arc<RecipeRecord>>,
    ids: Vec<RecipeId>,
    dims: HashMap<String, SortedDim>,
}

impl RecipeIndex {
    /// Builds the index from a catalog snapshot.
    pub fn build(records: impl IntoIterator<Item = RecipeRecord>) -> Self {
        let mut recipes = HashMap::new();
        let mut dims: HashMap<String, SortedDim> = HashMap::new();
        for record in records {
            // Ratio 1.0 seeds the dimensions with standard-portion amounts.
            for key in record.defined_keys() {
                dims.entry(key.to_owned())
                    .or_default()
                    .push(record.data(key, 1.0), record.id);
            }
            recipes.insert(record.id, Arc::new(record));
        }
        for dim in dims.values_mut() {
            dim.sort();
        }
        let mut ids: Vec<RecipeId> = recipes.keys().copied().collect();
        ids.sort();
        RecipeIndex { recipes, ids, dims }
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Exact lookup by id.
    pub fn get(&self, id: RecipeId) -> Result<&Arc<RecipeRecord>> {
        self.recipes.get(&id).ok_or(CoreError::NotFound { recipe: id })
    }

    pub fn contains(&self, id: RecipeId) -> bool {
        self.recipes.contains_key(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &Arc<RecipeRecord>> {
        self.recipes.values()
    }

    /// Sorted ascending (value, recipe) pairs for a data key, if any recipe
    /// defines it.
    pub fn values_for(&self, key: &str) -> Option<&SortedDim> {
        self.dims.get(key)
    }

    /// Uniform draw over the whole catalog.
    pub fn sample_uniform<R: Rng>(&self, rng: &mut R) -> Result<&Arc<RecipeRecord>> {
        if self.ids.is_empty() {
            return Err(CoreError::EmptyIndex {
                key: "catalog".to_owned(),
            });
        }
        self.get(self.ids[rng.random_range(0..self.ids.len())])
    }

    /// Draws one recipe with Gaussian-shaped weight on `key` around `target`.
    pub fn sample_near<R: Rng>(
        &self,
        key: &str,
        target: f64,
        spread: Spread,
        rng: &mut R,
    ) -> Result<&Arc<RecipeRecord>> {
        let dim = self.dims.get(key).ok_or_else(|| CoreError::EmptyIndex {
            key: key.to_owned(),
        })?;
        let id = dim.sample_near(target, spread, rng);
        self.get(id)
    }
}

/// Process-wide handle over the current catalog index.
///
/// Rebuilds replace the whole `Arc` under a write lock; running solves keep
/// using the snapshot they loaded, so a mid-solve refresh is never visible.
#[derive(Debug)]
pub struct SharedRecipeIndex {
    current: RwLock<Arc<RecipeIndex>>,
}

impl SharedRecipeIndex {
    pub fn new(index: RecipeIndex) -> Self {
        SharedRecipeIndex {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// Loads the current snapshot.
    pub fn load(&self) -> Arc<RecipeIndex> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Atomically replaces the index on a catalog-change signal.
    pub fn swap(&self, index: RecipeIndex) {
        let next = Arc::new(index);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn fixture() -> RecipeIndex {
        let values = [1.0, 2.0, 6.0, 10.0, 20.0];
        RecipeIndex::build(values.iter().enumerate().map(|(i, v)| {
            RecipeRecord::new(RecipeId(i as i64 + 1), format!("r{}", i + 1))
                .with_data("protein", *v)
        }))
    }

    #[test]
    fn values_for_is_sorted_ascending() {
        let index = fixture();
        let dim = index.values_for("protein").unwrap();
        let values: Vec<f64> = dim.pairs().map(|(v, _)| v).collect();
        assert_eq!(values, vec![1.0, 2.0, 6.0, 10.0, 20.0]);
    }

    #[test]
    fn get_unknown_recipe_fails() {
        let index = fixture();
        assert!(matches!(
            index.get(RecipeId(99)),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn sample_near_missing_key_is_empty_index() {
        let index = fixture();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = index
            .sample_near("unobtainium", 5.0, Spread::Default, &mut rng)
            .unwrap_err();
        assert!(matches!(err, CoreError::EmptyIndex { .. }));
    }

    #[test]
    fn sample_near_favors_the_target_value() {
        let index = fixture();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut draws: HashMap<RecipeId, u32> = HashMap::new();
        for _ in 0..100 {
            let r = index
                .sample_near("protein", 6.0, Spread::Explicit(3.0), &mut rng)
                .unwrap();
            *draws.entry(r.id).or_default() += 1;
        }
        let at = |id: i64| draws.get(&RecipeId(id)).copied().unwrap_or(0);
        // Recipe valued 6 wins, strictly more than farther-valued recipes.
        assert!(at(3) > at(1));
        assert!(at(3) > at(2));
        assert!(at(3) > at(4));
        assert!(at(3) > at(5));
    }

    #[test]
    fn sample_near_is_reproducible_for_a_fixed_seed() {
        let index = fixture();
        let run = || {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            (0..50)
                .map(|_| {
                    index
                        .sample_near("protein", 6.0, Spread::Default, &mut rng)
                        .unwrap()
                        .id
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn tied_values_split_draws_near_evenly() {
        let index = RecipeIndex::build((1..=2).map(|i| {
            RecipeRecord::new(RecipeId(i), format!("tied{i}")).with_data("protein", 5.0)
        }));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut draws = [0u32; 2];
        for _ in 0..200 {
            let r = index
                .sample_near("protein", 5.0, Spread::Default, &mut rng)
                .unwrap();
            draws[(r.id.0 - 1) as usize] += 1;
        }
        let diff = draws[0].abs_diff(draws[1]);
        assert!(diff < 60, "tied draws too uneven: {draws:?}");
    }

    #[test]
    fn shared_index_swap_is_whole_structure() {
        let shared = SharedRecipeIndex::new(fixture());
        let before = shared.load();
        shared.swap(RecipeIndex::build(std::iter::once(
            RecipeRecord::new(RecipeId(50), "new").with_data("protein", 9.0),
        )));
        let after = shared.load();
        // The old snapshot is untouched; the new one is a different structure.
        assert_eq!(before.len(), 5);
        assert_eq!(after.len(), 1);
        assert!(after.contains(RecipeId(50)));
    }
}
