//! The facade tying catalog, config, diet sources and solvers together.

use std::sync::Arc;

use rand::SeedableRng;
use tracing::info;

use menuforge_config::PlannerConfig;
use menuforge_core::constraint::Band;
use menuforge_core::{
    DishSlot, Indicator, PlanIndex, RecipeId, RecipeIndex, RecipeRecord, SharedRecipeIndex,
    Solution, TagId,
};
use menuforge_solver::{
    BandTargetsSource, DarwinSolver, DietConstraintSource, DietSourceRegistry,
    ExcludeRecipesFilter, ExcludeTagsFilter, NaiveSolver, PlannerRng, Problem, ProblemBuilder,
    ProfileContext, SolveOutcome, Solver, Strategy,
};
use menuforge_store::ResultWriter;

use crate::Result;

/// Per-request options for [`Planner::build_problem`].
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub profile: ProfileContext,
    pub disliked_tags: Vec<TagId>,
    pub pathology_tags: Vec<TagId>,
    pub declined_recipes: Vec<RecipeId>,
    pub seed_from_existing: bool,
    pub max_modifs: Option<usize>,
    pub daily_budget: Option<Band>,
    pub daily_prep_minutes: Option<Band>,
}

impl PlanOptions {
    pub fn new() -> Self {
        PlanOptions::default()
    }

    pub fn with_profile(mut self, profile: ProfileContext) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_disliked_tags(mut self, tags: impl IntoIterator<Item = TagId>) -> Self {
        self.disliked_tags = tags.into_iter().collect();
        self
    }

    pub fn with_pathology_tags(mut self, tags: impl IntoIterator<Item = TagId>) -> Self {
        self.pathology_tags = tags.into_iter().collect();
        self
    }

    pub fn with_declined_recipes(mut self, ids: impl IntoIterator<Item = RecipeId>) -> Self {
        self.declined_recipes = ids.into_iter().collect();
        self
    }

    /// Starts the search from the stored assignments instead of random ones.
    pub fn seed_from_existing(mut self) -> Self {
        self.seed_from_existing = true;
        self
    }

    /// Caps the number of free changes against the stored plan.
    pub fn with_max_modifs(mut self, max_modifs: usize) -> Self {
        self.max_modifs = Some(max_modifs);
        self
    }

    pub fn with_daily_budget(mut self, band: Band) -> Self {
        self.daily_budget = Some(band);
        self
    }

    pub fn with_daily_prep_minutes(mut self, band: Band) -> Self {
        self.daily_prep_minutes = Some(band);
        self
    }
}

/// Long-lived planning service: owns the shared catalog index, the solver
/// configuration and the registered diet sources.
pub struct Planner {
    index: SharedRecipeIndex,
    config: PlannerConfig,
    diets: DietSourceRegistry,
}

impl Planner {
    /// The band-targets pass-through source comes pre-registered.
    pub fn new(index: RecipeIndex, config: PlannerConfig) -> Self {
        let mut diets = DietSourceRegistry::new();
        diets.register(Arc::new(BandTargetsSource));
        Planner {
            index: SharedRecipeIndex::new(index),
            config,
            diets,
        }
    }

    pub fn register_diet(&mut self, source: Arc<dyn DietConstraintSource>) {
        self.diets.register(source);
    }

    /// Atomically replaces the catalog; running solves keep their snapshot.
    pub fn refresh_catalog(&self, records: impl IntoIterator<Item = RecipeRecord>) {
        self.index.swap(RecipeIndex::build(records));
        info!("catalog refreshed");
    }

    /// One RNG per request: seeded from config for reproducible runs,
    /// otherwise from OS entropy.
    pub fn rng(&self) -> PlannerRng {
        match self.config.random_seed {
            Some(seed) => PlannerRng::seed_from_u64(seed),
            None => PlannerRng::from_os_rng(),
        }
    }

    /// Compiles one optimization request against the current catalog.
    pub fn build_problem(
        &self,
        slots: Vec<DishSlot>,
        diet_source: &str,
        options: &PlanOptions,
    ) -> Result<Problem> {
        let plan = PlanIndex::new(slots)?;
        let source = self.diets.get(diet_source)?;
        let mut builder = ProblemBuilder::new(self.index.load(), plan)
            .with_diet(source.as_ref(), &options.profile)?;
        if !options.disliked_tags.is_empty() {
            builder = builder.with_filter(Box::new(ExcludeTagsFilter::dislikes(
                options.disliked_tags.iter().copied(),
            )));
        }
        if !options.pathology_tags.is_empty() {
            builder = builder.with_filter(Box::new(ExcludeTagsFilter::pathologies(
                options.pathology_tags.iter().copied(),
            )));
        }
        if !options.declined_recipes.is_empty() {
            builder = builder.with_filter(Box::new(ExcludeRecipesFilter::new(
                options.declined_recipes.iter().copied(),
            )));
        }
        if options.seed_from_existing {
            builder = builder.seed_from_existing();
        }
        if let Some(max_modifs) = options.max_modifs {
            builder = builder.with_max_modifs(max_modifs);
        }
        if let Some(band) = options.daily_budget {
            builder = builder.with_daily_budget(band);
        }
        if let Some(band) = options.daily_prep_minutes {
            builder = builder.with_daily_prep_minutes(band);
        }
        if let Some(limit) = self.config.time_limit() {
            builder = builder.with_time_limit(limit);
        }
        let mut rng = self.rng();
        Ok(builder.build(&mut rng)?)
    }

    pub fn solve(&self, problem: &Problem, strategy: Strategy) -> Result<SolveOutcome> {
        let mut rng = self.rng();
        let outcome = match strategy {
            Strategy::Naive => NaiveSolver.solve(problem, &mut rng)?,
            Strategy::Darwin => {
                DarwinSolver::new(self.config.darwin.clone()).solve(problem, &mut rng)?
            }
        };
        Ok(outcome)
    }

    /// Indicator breakdown of any solution against the problem's rules.
    pub fn evaluate(&self, problem: &Problem, solution: &Solution) -> Vec<Indicator> {
        problem.evaluator().indicators(solution)
    }

    pub fn persist(&self, solution: &Solution, writer: &dyn ResultWriter) -> Result<()> {
        writer.persist(solution)?;
        Ok(())
    }
}
