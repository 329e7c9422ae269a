// Recipe Share - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod export;
pub mod membership;
pub mod shopping_list;

#[cfg(feature = "server")]
pub mod api;

use tracing_subscriber::{fmt, EnvFilter};

// Re-export commonly used types
pub use config::Config;
pub use db::{open_database, setup_database};
pub use entities::{
    Ingredient, IngredientId, IngredientRecord,
    NewUser, User, UserId, UserView,
    Recipe, RecipeId, RecipeInput, RecipeView,
    Tag, TagId, TagRecord,
};
pub use error::{AppError, AppResult};
pub use export::{
    export_pdf, export_text, render_shopping_list,
    DocumentWriter, ExportError, PageLayout, PdfWriter, TextWriter,
};
pub use membership::{Favorites, Follows, MembershipRelation, ShoppingCart};
pub use shopping_list::{
    merge_lines, shopping_list_for_user,
    CartStore, IngredientLine, MergedLine, RecipeStore, ShoppingListAggregator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global tracing subscriber; `RUST_LOG` overrides the `info` default
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}
