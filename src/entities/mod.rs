// Entity Models - stored records and their SQLite operations
//
// Each entity module owns:
// - Its record type(s) and API views
// - The queries that read and write its tables

pub mod user;
pub mod tag;
pub mod ingredient;
pub mod recipe;

pub use user::{User, UserId, UserView, NewUser};
pub use tag::{Tag, TagId, TagRecord};
pub use ingredient::{Ingredient, IngredientId, IngredientRecord};
pub use recipe::{
    Recipe, RecipeId, RecipeInput, RecipeView, MinRecipe, IngredientAmount, RecipeIngredientLine,
};
