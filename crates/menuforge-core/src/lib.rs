//! MenuForge Core - domain types for the meal-plan optimizer
//!
//! This crate provides the building blocks shared by every solver strategy:
//! - The immutable recipe catalog and its sampling index
//! - The weekly plan model (days, meals, dish slots, lock states)
//! - Solutions (slot -> portioned recipes) and scores
//! - Soft constraints compiled into scoped cost rules

pub mod constraint;
pub mod error;
pub mod ids;
pub mod index;
pub mod plan;
pub mod recipe;
pub mod score;
pub mod solution;

pub use constraint::{Constraint, ConstraintSet, Guidance, Rule};
pub use error::{CoreError, Result};
pub use ids::{DayId, DishTypeId, MealId, MealTypeId, RecipeId, SlotId, TagId};
pub use index::{RecipeIndex, SharedRecipeIndex, SortedDim, Spread};
pub use plan::{DishSlot, LockState, PlanIndex};
pub use recipe::RecipeRecord;
pub use score::{BandFlag, Indicator, Score};
pub use solution::{Portion, Solution, MIN_RATIO};
