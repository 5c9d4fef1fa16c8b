//! MenuForge Solver Engine
//!
//! This crate turns a plan snapshot plus a constraint list into an
//! optimizable [`Problem`] and solves it with one of two interchangeable
//! strategies:
//! - [`NaiveSolver`]: fast, slot-independent weighted picks
//! - [`DarwinSolver`]: seeded population search with elitism
//!
//! Logging levels:
//! - **INFO**: solve start/end, problem scale, final score
//! - **DEBUG**: per-generation best cost and stall counter
//! - **TRACE**: operator detail

pub mod candidates;
pub mod diet;
pub mod eval;
pub mod problem;
pub mod solve;
pub mod stats;

pub use candidates::{CandidateSet, ExcludeRecipesFilter, ExcludeTagsFilter, RecipeFilter};
pub use diet::{BandTargetsSource, DietConstraintSource, DietSourceRegistry, ProfileContext};
pub use eval::Evaluator;
pub use problem::{Problem, ProblemBuilder};
pub use solve::{DarwinSolver, NaiveSolver, PlannerRng, SolveOutcome, Solver, Strategy};
pub use stats::SolveStats;
