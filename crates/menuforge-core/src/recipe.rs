//! Immutable recipe snapshots.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::ids::{DishTypeId, RecipeId, TagId};

/// Well-known data keys. Nutrients and scalar attributes share one keyspace
/// so that every constraint and sampling dimension works on the same map.
pub mod data_keys {
    /// Price of one standard portion, in cents.
    pub const PRICE: &str = "price";
    /// Preparation + cooking time, in minutes.
    pub const PREP_MINUTES: &str = "prep_minutes";
    /// Difficulty on an arbitrary 1..=5 scale.
    pub const DIFFICULTY: &str = "difficulty";
}

/// Immutable snapshot of one recipe.
///
/// Amounts in `data` describe one standard portion; portion ratios scale
/// them linearly at evaluation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub id: RecipeId,
    pub name: String,
    /// Nutrient and attribute amounts for a ratio of 1.0.
    data: HashMap<String, f64>,
    /// Dish types this recipe can fill.
    pub dish_types: BTreeSet<DishTypeId>,
    /// Food tags carried by the ingredients (dislike/pathology filtering).
    pub food_tags: BTreeSet<TagId>,
    /// Internal recipes (placeholders, custom user dishes) are exempt from
    /// variety accounting.
    pub internal: bool,
}

impl RecipeRecord {
    pub fn new(id: RecipeId, name: impl Into<String>) -> Self {
        RecipeRecord {
            id,
            name: name.into(),
            data: HashMap::new(),
            dish_types: BTreeSet::new(),
            food_tags: BTreeSet::new(),
            internal: false,
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, amount: f64) -> Self {
        self.data.insert(key.into(), amount);
        self
    }

    pub fn with_dish_type(mut self, dish_type: DishTypeId) -> Self {
        self.dish_types.insert(dish_type);
        self
    }

    pub fn with_food_tag(mut self, tag: TagId) -> Self {
        self.food_tags.insert(tag);
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Amount of `key` for the given portion ratio. Missing keys read as 0.
    #[inline]
    pub fn data(&self, key: &str, ratio: f64) -> f64 {
        self.data.get(key).copied().unwrap_or(0.0) * ratio
    }

    /// Raw amount of `key` for a standard portion, if defined.
    #[inline]
    pub fn raw(&self, key: &str) -> Option<f64> {
        self.data.get(key).copied()
    }

    /// Keys this recipe defines data for.
    pub fn defined_keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Whether this recipe can fill a slot of the given dish type.
    #[inline]
    pub fn suits(&self, dish_type: DishTypeId) -> bool {
        self.dish_types.contains(&dish_type)
    }
}
