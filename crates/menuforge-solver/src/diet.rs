//! Diet seam: pluggable constraint sources selected by key.
//!
//! The planner never computes nutritional targets itself; a
//! [`DietConstraintSource`] turns a user profile into the constraint list
//! for one solve. Sources are registered once at startup and looked up by
//! key per request.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::sync::Arc;

use menuforge_core::constraint::{Band, NutrientConstraint};
use menuforge_core::{Constraint, CoreError, Result};

/// Profile inputs a diet source may read. Opaque to the solver itself.
#[derive(Debug, Clone, Default)]
pub struct ProfileContext {
    /// Servings per dish; bands scale with it.
    pub nb_persons: f64,
    /// Per-data-key acceptance bands computed upstream.
    pub targets: BTreeMap<String, Band>,
}

impl ProfileContext {
    pub fn new(nb_persons: f64) -> Self {
        ProfileContext {
            nb_persons,
            targets: BTreeMap::new(),
        }
    }

    pub fn with_target(mut self, data_key: impl Into<String>, band: Band) -> Self {
        self.targets.insert(data_key.into(), band);
        self
    }
}

/// Produces the diet-specific constraints for one profile.
pub trait DietConstraintSource: Debug + Send + Sync {
    fn key(&self) -> &str;

    fn constraints(&self, context: &ProfileContext) -> Result<Vec<Box<dyn Constraint>>>;
}

/// Passes the profile's precomputed bands through as nutrient constraints,
/// scaled to the number of persons.
#[derive(Debug, Default)]
pub struct BandTargetsSource;

impl DietConstraintSource for BandTargetsSource {
    fn key(&self) -> &str {
        "band_targets"
    }

    fn constraints(&self, context: &ProfileContext) -> Result<Vec<Box<dyn Constraint>>> {
        let factor = if context.nb_persons > 0.0 {
            context.nb_persons
        } else {
            1.0
        };
        Ok(context
            .targets
            .iter()
            .map(|(key, band)| {
                Box::new(NutrientConstraint::new(key.clone(), band.scaled(factor)))
                    as Box<dyn Constraint>
            })
            .collect())
    }
}

/// Startup-time registry of diet sources, keyed by [`DietConstraintSource::key`].
#[derive(Debug, Default)]
pub struct DietSourceRegistry {
    sources: HashMap<String, Arc<dyn DietConstraintSource>>,
}

impl DietSourceRegistry {
    pub fn new() -> Self {
        DietSourceRegistry::default()
    }

    /// Registers a source; a later registration under the same key wins.
    pub fn register(&mut self, source: Arc<dyn DietConstraintSource>) {
        self.sources.insert(source.key().to_owned(), source);
    }

    /// Looks a source up by key; unknown keys are a configuration error.
    pub fn get(&self, key: &str) -> Result<Arc<dyn DietConstraintSource>> {
        self.sources.get(key).map(Arc::clone).ok_or_else(|| {
            CoreError::Configuration(format!("no diet source registered under {key:?}"))
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}
