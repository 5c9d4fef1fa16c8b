//! MenuForge Storage Seam
//!
//! The planner reads plans and recipe catalogs through [`PlanStore`] and
//! writes optimization results through [`ResultWriter`]. Both are traits so
//! the engine stays independent of the persistence engine behind them; the
//! in-memory implementation backs tests and demos.
//!
//! Persistence is transactional per plan: either the whole new assignment
//! set lands or the prior state is untouched.

mod memory;

use menuforge_core::{DishSlot, RecipeRecord, Solution};
use thiserror::Error;

pub use memory::MemoryStore;

/// Storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Concurrent writer touched the same plan.
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// Backend unreachable or mid-failure; prior state is intact.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Read-only access to the plan snapshot and the recipe catalog.
pub trait PlanStore: Send + Sync {
    /// Current dish slots with their lock states and assignments.
    fn load_slots(&self) -> Result<Vec<DishSlot>>;

    /// Full recipe catalog; callers rebuild their index from it on a
    /// catalog-change signal.
    fn load_catalog(&self) -> Result<Vec<RecipeRecord>>;
}

/// Write path for accepted solutions.
pub trait ResultWriter: Send + Sync {
    /// Replaces the stored assignments with the solution's, atomically.
    fn persist(&self, solution: &Solution) -> Result<()>;
}
