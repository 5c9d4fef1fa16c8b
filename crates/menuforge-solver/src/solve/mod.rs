//! Solver strategies.

mod darwin;
mod naive;

#[cfg(test)]
mod tests;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use menuforge_core::{Result, Score, Solution};

use crate::problem::Problem;
use crate::stats::SolveStats;

pub use darwin::DarwinSolver;
pub use naive::NaiveSolver;

/// The one RNG every solve is driven by. Seeded ChaCha keeps runs
/// reproducible across platforms.
pub type PlannerRng = ChaCha8Rng;

/// Strategy selector for the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Naive,
    Darwin,
}

/// Solution plus its score and the counters collected on the way.
#[derive(Debug)]
pub struct SolveOutcome {
    pub solution: Solution,
    pub score: Score,
    pub stats: SolveStats,
}

/// A solving strategy over a compiled [`Problem`].
pub trait Solver {
    fn solve(&self, problem: &Problem, rng: &mut PlannerRng) -> Result<SolveOutcome>;
}

/// Cost-proportional index pick; `None` when every weight is zero.
pub(crate) fn weighted_pick<R: Rng>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let mut draw = rng.random_range(0.0..total);
    for (index, weight) in weights.iter().enumerate() {
        if *weight <= 0.0 {
            continue;
        }
        if draw < *weight {
            return Some(index);
        }
        draw -= weight;
    }
    // Float accumulation can leave the draw past the last positive weight.
    weights.iter().rposition(|w| *w > 0.0)
}
