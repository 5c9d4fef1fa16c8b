//! Stochastic population search with elitist selection.
//!
//! Each generation scores the population, breeds children through rule-span
//! crossover and single-slot mutation, then truncates back to size keeping
//! the best individuals. Both operators exist in a blind and an oriented
//! form; the oriented share ramps up across the generation budget, moving
//! the search from exploration to exploitation.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, trace};

use menuforge_config::DarwinConfig;
use menuforge_core::{Result, Score, SlotId, Solution, Spread};

use crate::eval::Evaluator;
use crate::problem::Problem;
use crate::stats::SolveStats;

use super::{weighted_pick, PlannerRng, SolveOutcome, Solver};

/// Population-based strategy. Best cost is non-increasing per generation:
/// truncation always keeps the current best.
#[derive(Debug, Clone)]
pub struct DarwinSolver {
    config: DarwinConfig,
}

#[derive(Debug, Clone)]
struct Individual {
    solution: Solution,
    score: Score,
}

impl DarwinSolver {
    pub fn new(config: DarwinConfig) -> Self {
        DarwinSolver { config }
    }

    /// Slots of a rule the optimizer may actually touch.
    fn mutable_span(problem: &Problem, rule_index: usize) -> Vec<SlotId> {
        problem.constraints().rules()[rule_index]
            .slot_ids()
            .iter()
            .filter(|slot| problem.plan().is_mutable(**slot))
            .copied()
            .collect()
    }

    /// Rules usable for crossover: a non-empty mutable span covering at most
    /// half the mutable slots, so an exchange never swaps whole plans.
    fn crossover_rules(problem: &Problem) -> Vec<(usize, Vec<SlotId>)> {
        let nb_mutable = problem.plan().mutable_slot_ids().len();
        (0..problem.constraints().len())
            .filter_map(|index| {
                let span = Self::mutable_span(problem, index);
                (!span.is_empty() && span.len() * 2 <= nb_mutable).then_some((index, span))
            })
            .collect()
    }

    fn copy_span(child: &mut Solution, mate: &Solution, span: &[SlotId]) {
        for slot in span {
            child.set(*slot, mate.portions(*slot).iter().cloned());
        }
    }

    /// Blind crossover: a random eligible rule span exchanged both ways
    /// between two random parents.
    fn random_crossover(
        population: &[Individual],
        rules: &[(usize, Vec<SlotId>)],
        evaluator: &Evaluator<'_>,
        rng: &mut PlannerRng,
        stats: &mut SolveStats,
        children: &mut Vec<Individual>,
    ) {
        if rules.is_empty() {
            return;
        }
        let (_, span) = &rules[rng.random_range(0..rules.len())];
        let a = rng.random_range(0..population.len());
        let b = (a + 1 + rng.random_range(0..population.len() - 1)) % population.len();
        for (from, to) in [(a, b), (b, a)] {
            let mut solution = population[to].solution.clone();
            Self::copy_span(&mut solution, &population[from].solution, span);
            let score = evaluator.rescore(&population[to].score, &solution, span);
            stats.score_calculations += 1;
            children.push(Individual { solution, score });
        }
    }

    /// Oriented crossover: pick a rule proportionally to its cost in a
    /// random parent, then graft the span from a parent that does strictly
    /// better on that rule.
    fn oriented_crossover(
        population: &[Individual],
        rules: &[(usize, Vec<SlotId>)],
        evaluator: &Evaluator<'_>,
        rng: &mut PlannerRng,
        stats: &mut SolveStats,
        children: &mut Vec<Individual>,
    ) {
        if rules.is_empty() {
            return;
        }
        let parent = rng.random_range(0..population.len());
        let weights: Vec<f64> = rules
            .iter()
            .map(|(index, _)| population[parent].score.rule_cost(*index))
            .collect();
        let Some(pick) = weighted_pick(&weights, rng) else {
            return;
        };
        let (rule_index, span) = &rules[pick];
        let parent_cost = population[parent].score.rule_cost(*rule_index);
        let better: Vec<usize> = (0..population.len())
            .filter(|i| population[*i].score.rule_cost(*rule_index) < parent_cost)
            .collect();
        if better.is_empty() {
            return;
        }
        let mate = better[rng.random_range(0..better.len())];
        trace!(rule = rule_index, parent, mate, "oriented crossover");
        let mut solution = population[parent].solution.clone();
        Self::copy_span(&mut solution, &population[mate].solution, span);
        let score = evaluator.rescore(&population[parent].score, &solution, span);
        stats.score_calculations += 1;
        children.push(Individual { solution, score });
    }

    /// Blind mutation: one mutable slot redrawn uniformly.
    fn random_mutation(
        problem: &Problem,
        parent: &Individual,
        evaluator: &Evaluator<'_>,
        rng: &mut PlannerRng,
        stats: &mut SolveStats,
    ) -> Option<Individual> {
        let mutable = problem.plan().mutable_slot_ids();
        let slot = mutable[rng.random_range(0..mutable.len())];
        let set = problem.candidates(slot)?;
        let mut solution = parent.solution.clone();
        solution.set_single(slot, Arc::clone(set.sample_uniform(rng)), 1.0);
        let score = evaluator.rescore(&parent.score, &solution, &[slot]);
        stats.score_calculations += 1;
        Some(Individual { solution, score })
    }

    /// Oriented mutation: pick an unsatisfied rule proportionally to its
    /// cost, then redraw one of its slots towards the rule's target. Rules
    /// without numeric guidance fall back to a uniform redraw of the slot.
    fn oriented_mutation(
        problem: &Problem,
        parent: &Individual,
        evaluator: &Evaluator<'_>,
        rng: &mut PlannerRng,
        stats: &mut SolveStats,
    ) -> Option<Individual> {
        let rule_index = weighted_pick(parent.score.costs(), rng)?;
        let span = Self::mutable_span(problem, rule_index);
        if span.is_empty() {
            return Self::random_mutation(problem, parent, evaluator, rng, stats);
        }
        let slot = span[rng.random_range(0..span.len())];
        let set = problem.candidates(slot)?;
        trace!(rule = rule_index, slot = %slot, "oriented mutation");
        let rule = &problem.constraints().rules()[rule_index];
        let recipe = match rule.guidance(&parent.solution, slot) {
            Some(guidance) => set
                .sample_near(&guidance.data_key, guidance.target, Spread::Default, rng)
                .unwrap_or_else(|| set.sample_uniform(rng)),
            None => set.sample_uniform(rng),
        };
        let mut solution = parent.solution.clone();
        solution.set_single(slot, Arc::clone(recipe), 1.0);
        let score = evaluator.rescore(&parent.score, &solution, &[slot]);
        stats.score_calculations += 1;
        Some(Individual { solution, score })
    }
}

impl Default for DarwinSolver {
    fn default() -> Self {
        DarwinSolver::new(DarwinConfig::default())
    }
}

fn sort_population(population: &mut [Individual]) {
    population.sort_by(|a, b| a.score.total().total_cmp(&b.score.total()));
}

impl Solver for DarwinSolver {
    fn solve(&self, problem: &Problem, rng: &mut PlannerRng) -> Result<SolveOutcome> {
        let mut stats = SolveStats::start();
        let evaluator = problem.evaluator();
        let mutable = problem.plan().mutable_slot_ids();
        let baseline = problem.baseline().as_ref().clone();

        if mutable.is_empty() {
            let score = evaluator.score(&baseline);
            stats.score_calculations += 1;
            stats.finish("darwin", score.total());
            return Ok(SolveOutcome {
                solution: baseline,
                score,
                stats,
            });
        }

        // Hand-built configs can skip DarwinConfig::validate; clamp to the
        // smallest population the operators can mate.
        let pop_size = self.config.population_size.max(2);
        let mut population = Vec::with_capacity(pop_size * 2);
        for i in 0..pop_size {
            let mut solution = baseline.clone();
            // The baseline itself always joins; the rest starts randomized
            // unless the caller wants to stay close to the existing plan.
            if i > 0 && !problem.seed_from_existing() {
                for slot in mutable {
                    if let Some(set) = problem.candidates(*slot) {
                        solution.set_single(*slot, Arc::clone(set.sample_uniform(rng)), 1.0);
                    }
                }
            }
            let score = evaluator.score(&solution);
            stats.score_calculations += 1;
            population.push(Individual { solution, score });
        }
        sort_population(&mut population);

        let crossover_rules = Self::crossover_rules(problem);
        let deadline = problem.time_limit();
        let nb_generations = self.config.nb_generations.max(1);
        let mut best = population[0].score.total();
        let mut stall = 0u64;

        for generation in 0..nb_generations {
            if population[0].score.is_zero() {
                break;
            }
            if deadline.is_some_and(|d| stats.elapsed() >= d) {
                stats.timed_out = true;
                break;
            }
            let progress = generation as f64 / nb_generations as f64;
            let mut children = Vec::new();

            let nb_cross = (self.config.crossover_rate * pop_size as f64).round() as usize;
            for _ in 0..nb_cross {
                if rng.random_bool(self.config.oriented_crossover_rate(progress).clamp(0.0, 1.0)) {
                    Self::oriented_crossover(
                        &population,
                        &crossover_rules,
                        &evaluator,
                        rng,
                        &mut stats,
                        &mut children,
                    );
                } else {
                    Self::random_crossover(
                        &population,
                        &crossover_rules,
                        &evaluator,
                        rng,
                        &mut stats,
                        &mut children,
                    );
                }
            }

            let nb_mut = (self.config.mutation_rate * pop_size as f64).round() as usize;
            for _ in 0..nb_mut {
                let parent = &population[rng.random_range(0..population.len())];
                let child =
                    if rng.random_bool(self.config.oriented_mutation_rate(progress).clamp(0.0, 1.0)) {
                    Self::oriented_mutation(problem, parent, &evaluator, rng, &mut stats)
                } else {
                    Self::random_mutation(problem, parent, &evaluator, rng, &mut stats)
                };
                children.extend(child);
            }

            let cutoff = population[population.len().min(pop_size) - 1].score.total();
            stats.accepted_children +=
                children.iter().filter(|c| c.score.total() < cutoff).count() as u64;
            population.extend(children);
            sort_population(&mut population);
            population.truncate(pop_size);

            let now_best = population[0].score.total();
            if now_best < best {
                best = now_best;
                stall = 0;
            } else {
                stall += 1;
            }
            stats.record_generation(now_best);
            debug!(generation, best = now_best, stall, "generation done");
            if stall >= self.config.max_stalled_generations {
                stats.stalled = true;
                break;
            }
        }

        let winner = population.swap_remove(0);
        stats.finish("darwin", winner.score.total());
        info!(
            cost = winner.score.total(),
            generations = stats.generations,
            "darwin solve done"
        );
        Ok(SolveOutcome {
            solution: winner.solution,
            score: winner.score,
            stats,
        })
    }
}
