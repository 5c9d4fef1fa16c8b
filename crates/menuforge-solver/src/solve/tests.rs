//! End-to-end solver behavior on small plans.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;

use menuforge_config::DarwinConfig;
use menuforge_core::constraint::{Band, NutrientConstraint};
use menuforge_core::{
    CoreError, DayId, DishSlot, DishTypeId, MealId, MealTypeId, PlanIndex, RecipeId, RecipeIndex,
    RecipeRecord, SlotId, Solution,
};

use crate::candidates::ExcludeRecipesFilter;
use crate::problem::{Problem, ProblemBuilder};

use super::*;

fn recipe(id: i64, kcal: f64) -> RecipeRecord {
    RecipeRecord::new(RecipeId(id), format!("r{id}"))
        .with_data("kcal", kcal)
        .with_dish_type(DishTypeId(1))
}

fn slot(day: i64, meal: i64) -> DishSlot {
    DishSlot::new(
        SlotId(day * 10 + meal),
        DayId(day),
        MealId(day * 100 + meal),
        MealTypeId(meal),
        DishTypeId(1),
    )
}

fn rng(seed: u64) -> PlannerRng {
    PlannerRng::seed_from_u64(seed)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn assigned_ids(problem: &Problem, solution: &Solution) -> Vec<RecipeId> {
    problem
        .plan()
        .all_slot_ids()
        .iter()
        .flat_map(|s| solution.recipe_ids(*s).collect::<Vec<_>>())
        .collect()
}

/// Two days, one dish per day; the band is only satisfied by `good`.
/// Starting from a plan serving `bad` twice, each change saves 80 of
/// residual cost and costs `cost_per_modif` beyond the first free one.
fn change_budget_problem(cost_per_modif: f64, rng: &mut PlannerRng) -> Problem {
    let index = Arc::new(RecipeIndex::build(vec![
        recipe(1, 20.0),
        recipe(2, 20.0),
        recipe(3, 16.0),
    ]));
    let plan = PlanIndex::new(vec![
        slot(1, 1).with_assigned(RecipeId(3), 1.0),
        slot(2, 1).with_assigned(RecipeId(3), 1.0),
    ])
    .unwrap();
    ProblemBuilder::new(index, plan)
        .with_constraint(Box::new(
            NutrientConstraint::new("kcal", Band::min_only(20.0))
                .with_tolerances(0.0, 0.0)
                .with_cost_per_percent_out(0.2)
                .without_weekly_rule(),
        ))
        .seed_from_existing()
        .with_change_budget(1, cost_per_modif)
        .build(rng)
        .unwrap()
}

#[test]
fn solvers_fill_required_slots_and_keep_locked_ones() {
    let index = Arc::new(RecipeIndex::build((1..=5).map(|i| recipe(i, 100.0 * i as f64))));
    let plan = PlanIndex::new(vec![
        slot(1, 1)
            .locked(menuforge_core::LockState::Validated)
            .with_assigned(RecipeId(2), 1.0),
        slot(1, 2),
        slot(2, 1),
        slot(2, 2),
    ])
    .unwrap();
    let mut rng = rng(11);
    let problem = ProblemBuilder::new(index, plan)
        .with_constraint(Box::new(NutrientConstraint::new(
            "kcal",
            Band::new(Some(300.0), Some(500.0)),
        )))
        .build(&mut rng)
        .unwrap();

    for outcome in [
        NaiveSolver.solve(&problem, &mut rng).unwrap(),
        DarwinSolver::default().solve(&problem, &mut rng).unwrap(),
    ] {
        for slot_id in problem.plan().all_slot_ids() {
            assert!(outcome.solution.has_assignment(*slot_id));
            assert!(outcome.solution.portions(*slot_id).iter().all(|p| p.ratio > 0.0));
        }
        // The locked slot is carried verbatim from the baseline.
        assert!(outcome
            .solution
            .same_assignment(problem.baseline(), SlotId(11)));
        assert_eq!(
            outcome.solution.recipe_ids(SlotId(11)).collect::<Vec<_>>(),
            vec![RecipeId(2)]
        );
        assert!(outcome.score.total() >= 0.0);
    }
}

#[test]
fn optional_slot_keeps_its_stored_assignment() {
    let index = Arc::new(RecipeIndex::build((1..=4).map(|i| recipe(i, 100.0 * i as f64))));
    let plan = PlanIndex::new(vec![
        slot(1, 1),
        slot(1, 2).optional().with_assigned(RecipeId(4), 1.0),
    ])
    .unwrap();
    let mut rng = rng(13);
    let problem = ProblemBuilder::new(index, plan)
        .with_constraint(Box::new(NutrientConstraint::new(
            "kcal",
            Band::new(Some(100.0), Some(300.0)),
        )))
        .build(&mut rng)
        .unwrap();

    // The optional slot sits outside the search yet carries its assignment
    // all the way into the result.
    assert_eq!(
        problem.baseline().recipe_ids(SlotId(12)).collect::<Vec<_>>(),
        vec![RecipeId(4)]
    );
    for outcome in [
        NaiveSolver.solve(&problem, &mut rng).unwrap(),
        DarwinSolver::default().solve(&problem, &mut rng).unwrap(),
    ] {
        assert!(outcome
            .solution
            .same_assignment(problem.baseline(), SlotId(12)));
        assert_eq!(
            outcome.solution.recipe_ids(SlotId(12)).collect::<Vec<_>>(),
            vec![RecipeId(4)]
        );
    }
}

#[test]
fn undersized_population_config_still_solves() {
    let index = Arc::new(RecipeIndex::build((1..=4).map(|i| recipe(i, 100.0 * i as f64))));
    let plan = PlanIndex::new(vec![slot(1, 1), slot(1, 2)]).unwrap();
    let mut rng = rng(31);
    let problem = ProblemBuilder::new(index, plan)
        .with_constraint(Box::new(NutrientConstraint::new(
            "kcal",
            Band::new(Some(300.0), Some(500.0)),
        )))
        .build(&mut rng)
        .unwrap();

    // Field access bypasses config validation; the solver copes by clamping
    // to the smallest population the operators can mate.
    let outcome = DarwinSolver::new(DarwinConfig {
        population_size: 1,
        nb_generations: 10,
        ..DarwinConfig::default()
    })
    .solve(&problem, &mut rng)
    .unwrap();
    for slot_id in problem.plan().all_slot_ids() {
        assert!(outcome.solution.has_assignment(*slot_id));
    }
}

#[test]
fn darwin_best_cost_never_increases() {
    init_tracing();
    let index = Arc::new(RecipeIndex::build(
        (1..=12).map(|i| recipe(i, 120.0 * i as f64)),
    ));
    let plan = PlanIndex::new(vec![
        slot(1, 1),
        slot(1, 2),
        slot(2, 1),
        slot(2, 2),
        slot(3, 1),
        slot(3, 2),
    ])
    .unwrap();
    let mut rng = rng(5);
    let problem = ProblemBuilder::new(index, plan)
        .with_constraint(Box::new(NutrientConstraint::new(
            "kcal",
            Band::new(Some(1800.0), Some(2200.0)),
        )))
        .build(&mut rng)
        .unwrap();

    let outcome = DarwinSolver::new(DarwinConfig {
        population_size: 12,
        nb_generations: 40,
        ..DarwinConfig::default()
    })
    .solve(&problem, &mut rng)
    .unwrap();

    for pair in outcome.stats.best_costs.windows(2) {
        assert!(pair[1] <= pair[0], "best cost increased: {pair:?}");
    }
    if let Some(last) = outcome.stats.best_costs.last() {
        assert_eq!(outcome.score.total(), *last);
    }
}

#[test]
fn fixed_seed_gives_identical_runs() {
    let run = |seed: u64| {
        let index = Arc::new(RecipeIndex::build((1..=8).map(|i| recipe(i, 90.0 * i as f64))));
        let plan =
            PlanIndex::new(vec![slot(1, 1), slot(1, 2), slot(2, 1), slot(2, 2)]).unwrap();
        let mut rng = rng(seed);
        let problem = ProblemBuilder::new(index, plan)
            .with_constraint(Box::new(NutrientConstraint::new(
                "kcal",
                Band::new(Some(500.0), Some(700.0)),
            )))
            .build(&mut rng)
            .unwrap();
        let outcome = DarwinSolver::default().solve(&problem, &mut rng).unwrap();
        (assigned_ids(&problem, &outcome.solution), outcome.score.total())
    };
    assert_eq!(run(9), run(9));
}

#[test]
fn expired_time_limit_still_returns_a_solution() {
    let index = Arc::new(RecipeIndex::build((1..=4).map(|i| recipe(i, 100.0))));
    let plan = PlanIndex::new(vec![slot(1, 1), slot(1, 2)]).unwrap();
    let mut rng = rng(2);
    let problem = ProblemBuilder::new(index, plan)
        .with_constraint(Box::new(NutrientConstraint::new(
            "kcal",
            Band::min_only(500.0),
        )))
        .with_time_limit(Duration::ZERO)
        .build(&mut rng)
        .unwrap();

    let outcome = DarwinSolver::default().solve(&problem, &mut rng).unwrap();
    assert!(outcome.stats.timed_out);
    assert_eq!(outcome.stats.generations, 0);
    assert!(outcome.solution.has_assignment(SlotId(11)));
}

#[test]
fn change_budget_keeps_the_plan_when_changes_cost_more() {
    // One change is free and removes 80; the second costs 1000 to remove
    // the remaining 80, so the solver stops after one.
    let mut rng = rng(21);
    let problem = change_budget_problem(1000.0, &mut rng);
    let outcome = DarwinSolver::default().solve(&problem, &mut rng).unwrap();
    assert!((outcome.score.total() - 80.0).abs() < 1e-6, "total {}", outcome.score.total());
    assert_eq!(
        outcome
            .solution
            .diff_count(problem.baseline(), problem.plan().all_slot_ids()),
        1
    );
}

#[test]
fn change_budget_spends_when_the_residual_is_larger() {
    // The second change costs 40 and removes 80 of residual: worth it.
    let mut rng = rng(22);
    let problem = change_budget_problem(40.0, &mut rng);
    let outcome = DarwinSolver::default().solve(&problem, &mut rng).unwrap();
    assert!((outcome.score.total() - 40.0).abs() < 1e-6, "total {}", outcome.score.total());
    assert_eq!(
        outcome
            .solution
            .diff_count(problem.baseline(), problem.plan().all_slot_ids()),
        2
    );
}

#[test]
fn tripled_plan_converges_to_distinct_recipes() {
    let index = Arc::new(RecipeIndex::build((1..=3).map(|i| recipe(i, 100.0))));
    let plan = PlanIndex::new(vec![
        slot(1, 1).with_assigned(RecipeId(1), 1.0),
        slot(1, 2).with_assigned(RecipeId(1), 1.0),
        slot(1, 3).with_assigned(RecipeId(1), 1.0),
    ])
    .unwrap();
    let mut rng = rng(17);
    let problem = ProblemBuilder::new(index, plan)
        .seed_from_existing()
        .build(&mut rng)
        .unwrap();

    let outcome = DarwinSolver::default().solve(&problem, &mut rng).unwrap();
    assert_eq!(outcome.score.total(), 0.0);
    let mut ids = assigned_ids(&problem, &outcome.solution);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn empty_candidate_set_fails_the_whole_build() {
    let index = Arc::new(RecipeIndex::build(vec![recipe(1, 100.0)]));
    let plan = PlanIndex::new(vec![slot(1, 1)]).unwrap();
    let mut rng = rng(1);
    let err = ProblemBuilder::new(index, plan)
        .with_filter(Box::new(ExcludeRecipesFilter::new([RecipeId(1)])))
        .build(&mut rng)
        .unwrap_err();
    assert!(matches!(err, CoreError::NoCandidates { slot } if slot == SlotId(11)));
}

#[test]
fn locked_slot_with_unknown_recipe_fails_the_build() {
    let index = Arc::new(RecipeIndex::build(vec![recipe(1, 100.0)]));
    let plan = PlanIndex::new(vec![
        slot(1, 1)
            .locked(menuforge_core::LockState::UserForced)
            .with_assigned(RecipeId(99), 1.0),
        slot(1, 2),
    ])
    .unwrap();
    let mut rng = rng(1);
    let err = ProblemBuilder::new(index, plan).build(&mut rng).unwrap_err();
    assert!(matches!(err, CoreError::NotFound { recipe } if recipe == RecipeId(99)));
}
