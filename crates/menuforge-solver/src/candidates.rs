//! Per-slot candidate sets: hard filtering plus restricted sampling.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::sync::Arc;

use rand::Rng;

use menuforge_core::index::{SortedDim, Spread};
use menuforge_core::{RecipeId, RecipeRecord, TagId};

/// Hard eligibility filter applied while building candidate sets.
///
/// Filters remove recipes outright; they are not soft constraints and never
/// appear in scores.
pub trait RecipeFilter: Debug + Send + Sync {
    fn label(&self) -> &str;
    fn accepts(&self, recipe: &RecipeRecord) -> bool;
}

/// Rejects recipes carrying any of the given food tags.
#[derive(Debug)]
pub struct ExcludeTagsFilter {
    label: String,
    tags: BTreeSet<TagId>,
}

impl ExcludeTagsFilter {
    /// Tags the user dislikes.
    pub fn dislikes(tags: impl IntoIterator<Item = TagId>) -> Self {
        ExcludeTagsFilter {
            label: "dislikes".to_owned(),
            tags: tags.into_iter().collect(),
        }
    }

    /// Tags excluded by a pathology (allergies, intolerances).
    pub fn pathologies(tags: impl IntoIterator<Item = TagId>) -> Self {
        ExcludeTagsFilter {
            label: "pathologies".to_owned(),
            tags: tags.into_iter().collect(),
        }
    }
}

impl RecipeFilter for ExcludeTagsFilter {
    fn label(&self) -> &str {
        &self.label
    }

    fn accepts(&self, recipe: &RecipeRecord) -> bool {
        self.tags.is_disjoint(&recipe.food_tags)
    }
}

/// Rejects specific recipes, e.g. suggestions the user recently declined.
#[derive(Debug)]
pub struct ExcludeRecipesFilter {
    ids: BTreeSet<RecipeId>,
}

impl ExcludeRecipesFilter {
    pub fn new(ids: impl IntoIterator<Item = RecipeId>) -> Self {
        ExcludeRecipesFilter {
            ids: ids.into_iter().collect(),
        }
    }
}

impl RecipeFilter for ExcludeRecipesFilter {
    fn label(&self) -> &str {
        "declined"
    }

    fn accepts(&self, recipe: &RecipeRecord) -> bool {
        !self.ids.contains(&recipe.id)
    }
}

/// The recipes eligible for one slot, with their own sorted sampling
/// dimensions so candidate-restricted draws keep the O(log n) bound.
///
/// Computed once per Problem and immutable afterwards.
#[derive(Debug)]
pub struct CandidateSet {
    recipes: Vec<Arc<RecipeRecord>>,
    by_id: HashMap<RecipeId, usize>,
    dims: HashMap<String, SortedDim>,
}

impl CandidateSet {
    pub(crate) fn build(mut recipes: Vec<Arc<RecipeRecord>>) -> Self {
        recipes.sort_by_key(|r| r.id);
        let by_id = recipes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();
        let mut keys: BTreeSet<String> = BTreeSet::new();
        for recipe in &recipes {
            keys.extend(recipe.defined_keys().map(str::to_owned));
        }
        let dims = keys
            .into_iter()
            .map(|key| {
                let dim = SortedDim::from_pairs(
                    recipes
                        .iter()
                        .filter(|r| r.raw(&key).is_some())
                        .map(|r| (r.data(&key, 1.0), r.id)),
                );
                (key, dim)
            })
            .collect();
        CandidateSet { recipes, by_id, dims }
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn contains(&self, id: RecipeId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn get(&self, id: RecipeId) -> Option<&Arc<RecipeRecord>> {
        self.by_id.get(&id).map(|i| &self.recipes[*i])
    }

    pub fn recipes(&self) -> &[Arc<RecipeRecord>] {
        &self.recipes
    }

    /// Uniform draw. Candidate sets are only built non-empty.
    pub fn sample_uniform<R: Rng>(&self, rng: &mut R) -> &Arc<RecipeRecord> {
        debug_assert!(!self.recipes.is_empty());
        &self.recipes[rng.random_range(0..self.recipes.len())]
    }

    /// Gaussian-weighted draw on `key` around `target`.
    ///
    /// Returns `None` when no candidate defines the key (the sparse-catalog
    /// case); callers fall back to a uniform draw.
    pub fn sample_near<R: Rng>(
        &self,
        key: &str,
        target: f64,
        spread: Spread,
        rng: &mut R,
    ) -> Option<&Arc<RecipeRecord>> {
        let dim = self.dims.get(key)?;
        if dim.is_empty() {
            return None;
        }
        let id = dim.sample_near(target, spread, rng);
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use menuforge_core::DishTypeId;

    use super::*;

    fn recipe(id: i64, kcal: f64, tag: Option<i64>) -> Arc<RecipeRecord> {
        let mut r = RecipeRecord::new(RecipeId(id), format!("r{id}"))
            .with_data("kcal", kcal)
            .with_dish_type(DishTypeId(1));
        if let Some(tag) = tag {
            r = r.with_food_tag(TagId(tag));
        }
        Arc::new(r)
    }

    #[test]
    fn tag_filter_rejects_carriers() {
        let filter = ExcludeTagsFilter::dislikes([TagId(7)]);
        assert!(!filter.accepts(&recipe(1, 100.0, Some(7))));
        assert!(filter.accepts(&recipe(2, 100.0, Some(8))));
        assert!(filter.accepts(&recipe(3, 100.0, None)));
    }

    #[test]
    fn declined_filter_rejects_by_id() {
        let filter = ExcludeRecipesFilter::new([RecipeId(2)]);
        assert!(filter.accepts(&recipe(1, 100.0, None)));
        assert!(!filter.accepts(&recipe(2, 100.0, None)));
    }

    #[test]
    fn sample_near_without_dimension_is_none() {
        let set = CandidateSet::build(vec![recipe(1, 100.0, None)]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(set
            .sample_near("unobtainium", 1.0, Spread::Default, &mut rng)
            .is_none());
        assert!(set
            .sample_near("kcal", 90.0, Spread::Default, &mut rng)
            .is_some());
    }
}
