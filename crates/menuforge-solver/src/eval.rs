//! Evaluation facade over a compiled constraint set.

use menuforge_core::{ConstraintSet, Indicator, Score, SlotId, Solution};

/// Scores solutions against one problem's compiled rules.
///
/// `score` is the full pass; `rescore` is the darwin hot path and only
/// recomputes rules touching a changed slot.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    rules: &'a ConstraintSet,
}

impl<'a> Evaluator<'a> {
    pub fn new(rules: &'a ConstraintSet) -> Self {
        Evaluator { rules }
    }

    pub fn score(&self, solution: &Solution) -> Score {
        self.rules.evaluate(solution)
    }

    pub fn rescore(&self, base: &Score, solution: &Solution, changed: &[SlotId]) -> Score {
        self.rules.rescore(base, solution, changed)
    }

    /// Cold path: one user-facing row per rule, zero-cost rows included.
    pub fn indicators(&self, solution: &Solution) -> Vec<Indicator> {
        self.rules.indicators(solution)
    }
}
