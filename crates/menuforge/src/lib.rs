//! MenuForge - constraint-driven meal-plan optimization
//!
//! Assigns recipes to the dish slots of a weekly plan so that nutrient
//! bands, variety, budget and change-budget constraints are satisfied as
//! well as possible. The entry point is [`Planner`]; the crates underneath
//! are re-exported for direct use.
//!
//! # Example
//!
//! ```
//! use menuforge::{
//!     Band, DayId, DishSlot, DishTypeId, MealId, MealTypeId, PlanOptions, Planner,
//!     PlannerConfig, ProfileContext, RecipeId, RecipeIndex, RecipeRecord, SlotId,
//!     Strategy,
//! };
//!
//! let catalog = (1..=6).map(|i| {
//!     RecipeRecord::new(RecipeId(i), format!("recipe {i}"))
//!         .with_data("kcal", 150.0 * i as f64)
//!         .with_dish_type(DishTypeId(1))
//! });
//! let planner = Planner::new(
//!     RecipeIndex::build(catalog),
//!     PlannerConfig::new().with_random_seed(42),
//! );
//!
//! let slots = vec![
//!     DishSlot::new(SlotId(1), DayId(1), MealId(11), MealTypeId(1), DishTypeId(1)),
//!     DishSlot::new(SlotId(2), DayId(1), MealId(12), MealTypeId(2), DishTypeId(1)),
//! ];
//! let options = PlanOptions::new().with_profile(
//!     ProfileContext::new(1.0).with_target("kcal", Band::new(Some(800.0), Some(1200.0))),
//! );
//!
//! let problem = planner.build_problem(slots, "band_targets", &options).unwrap();
//! let outcome = planner.solve(&problem, Strategy::Darwin).unwrap();
//! assert!(outcome.solution.has_assignment(SlotId(1)));
//! ```

mod planner;

use thiserror::Error;

pub use menuforge_config::{ConfigError, DarwinConfig, PlannerConfig};
pub use menuforge_core::constraint::{
    Band, MaxModifsConstraint, MealTypeBalanceConstraint, NutrientBalanceConstraint,
    NutrientConstraint, UnicityConstraint,
};
pub use menuforge_core::{
    BandFlag, Constraint, ConstraintSet, CoreError, DayId, DishSlot, DishTypeId, Indicator,
    LockState, MealId, MealTypeId, PlanIndex, Portion, RecipeId, RecipeIndex, RecipeRecord, Rule,
    Score, SharedRecipeIndex, SlotId, Solution, Spread, TagId, MIN_RATIO,
};
pub use menuforge_solver::{
    BandTargetsSource, CandidateSet, DarwinSolver, DietConstraintSource, DietSourceRegistry,
    Evaluator, ExcludeRecipesFilter, ExcludeTagsFilter, NaiveSolver, PlannerRng, Problem,
    ProblemBuilder, ProfileContext, RecipeFilter, SolveOutcome, SolveStats, Solver, Strategy,
};
pub use menuforge_store::{MemoryStore, PlanStore, ResultWriter, StoreError};

pub use planner::{PlanOptions, Planner};

/// Any failure surfaced by the facade.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
