//! Typed identifiers for the plan and catalog domain.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                $name(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a recipe in the catalog.
    RecipeId
);
id_type!(
    /// Identifier of a dish slot inside the weekly plan.
    SlotId
);
id_type!(
    /// Identifier of a day of the plan.
    DayId
);
id_type!(
    /// Identifier of a meal (one day holds several meals).
    MealId
);
id_type!(
    /// Identifier of a meal type shared across days (e.g. all lunches).
    MealTypeId
);
id_type!(
    /// Identifier of a dish type (starter, main course, dessert, ...).
    DishTypeId
);
id_type!(
    /// Identifier of a food tag used for dislike/pathology filtering.
    TagId
);
