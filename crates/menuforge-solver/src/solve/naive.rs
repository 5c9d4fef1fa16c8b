//! Greedy one-pass strategy: each slot picked independently.

use std::sync::Arc;

use tracing::info;

use menuforge_core::constraint::Guidance;
use menuforge_core::{Result, Spread};

use crate::problem::Problem;
use crate::stats::SolveStats;

use super::{PlannerRng, SolveOutcome, Solver};

/// Fills every mutable slot with one weighted draw, steered by the
/// costliest rule touching the slot. O(#slots); no search.
///
/// Used as the fast first answer and as the fallback when the darwin
/// budget is not worth spending (tiny plans).
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveSolver;

impl Solver for NaiveSolver {
    fn solve(&self, problem: &Problem, rng: &mut PlannerRng) -> Result<SolveOutcome> {
        let mut stats = SolveStats::start();
        let mut solution = problem.baseline().as_ref().clone();
        let rules = problem.constraints();

        for slot in problem.plan().mutable_slot_ids() {
            let Some(set) = problem.candidates(*slot) else {
                continue;
            };
            // The costliest unsatisfied rule touching this slot drives the
            // draw; slots under no pressure are drawn uniformly.
            let mut driver: Option<(f64, Guidance)> = None;
            for index in rules.rules_touching(*slot) {
                let rule = &rules.rules()[*index];
                let cost = rule.cost(&solution);
                stats.score_calculations += 1;
                if cost <= 0.0 {
                    continue;
                }
                if driver.as_ref().map_or(true, |(best, _)| cost > *best) {
                    if let Some(guidance) = rule.guidance(&solution, *slot) {
                        driver = Some((cost, guidance));
                    }
                }
            }
            let recipe = match &driver {
                Some((_, guidance)) => set
                    .sample_near(&guidance.data_key, guidance.target, Spread::Default, rng)
                    .unwrap_or_else(|| set.sample_uniform(rng)),
                None => set.sample_uniform(rng),
            };
            solution.set_single(*slot, Arc::clone(recipe), 1.0);
        }

        let score = problem.evaluator().score(&solution);
        stats.score_calculations += 1;
        stats.finish("naive", score.total());
        info!(cost = score.total(), "naive solve done");
        Ok(SolveOutcome {
            solution,
            score,
            stats,
        })
    }
}
