//! Error types for MenuForge

use thiserror::Error;

use crate::ids::{RecipeId, SlotId};

/// Main error type for MenuForge core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A constraint or plan was malformed. Fatal, detected before solving.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A slot that requires an assignment has zero eligible recipes.
    /// The whole optimization batch aborts; partial plans are never produced.
    #[error("slot {slot:?} has no candidate recipes")]
    NoCandidates { slot: SlotId },

    /// A sampling dimension holds no data for the requested key.
    #[error("no recipe carries data for key {key:?}")]
    EmptyIndex { key: String },

    /// A recipe id is absent from the catalog index.
    #[error("recipe {recipe:?} not found in the index")]
    NotFound { recipe: RecipeId },
}

/// Result type alias for MenuForge core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
