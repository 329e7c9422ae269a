// 🛒 Shopping List Aggregator
//
// cart entries → recipes → ingredient lines → merged by (name, unit)
//
// The merge step is a pure function over lines so it can be tested without
// storage. Store access goes through two small traits; the SQLite-backed
// implementations live at the bottom of this file.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::entities::recipe::{get_ingredient_lines, RecipeId};
use crate::entities::user::UserId;
use crate::error::AppResult;
use crate::membership::ShoppingCart;

// ============================================================================
// TYPES
// ============================================================================

/// One ingredient requirement as read from a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

impl IngredientLine {
    pub fn new(name: &str, measurement_unit: &str, amount: i64) -> Self {
        Self {
            name: name.to_string(),
            measurement_unit: measurement_unit.to_string(),
            amount,
        }
    }
}

/// Ingredient identity: the same name under different units never merges
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IngredientKey {
    pub name: String,
    pub measurement_unit: String,
}

/// One ingredient's total across every recipe in the cart.
///
/// Totals are widened to `i128`: any number of `i64` amounts below 2^64 lines
/// sums without wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i128,
}

// ============================================================================
// STORE INTERFACES
// ============================================================================

pub trait CartStore {
    /// Recipe ids in the user's cart, in a stable order
    fn list_carted_recipe_ids(&self, user_id: UserId) -> AppResult<Vec<RecipeId>>;
}

pub trait RecipeStore {
    /// Ingredient lines of a recipe; empty if the recipe no longer exists
    fn get_ingredient_lines(&self, recipe_id: RecipeId) -> AppResult<Vec<IngredientLine>>;
}

// ============================================================================
// MERGE
// ============================================================================

/// Sum amounts per (name, unit), keeping first-seen order
pub fn merge_lines<I>(lines: I) -> Vec<MergedLine>
where
    I: IntoIterator<Item = IngredientLine>,
{
    let mut positions: HashMap<IngredientKey, usize> = HashMap::new();
    let mut merged: Vec<MergedLine> = Vec::new();

    for line in lines {
        let key = IngredientKey {
            name: line.name,
            measurement_unit: line.measurement_unit,
        };

        match positions.get(&key) {
            Some(&index) => merged[index].total_amount += i128::from(line.amount),
            None => {
                positions.insert(key.clone(), merged.len());
                merged.push(MergedLine {
                    name: key.name,
                    measurement_unit: key.measurement_unit,
                    total_amount: i128::from(line.amount),
                });
            }
        }
    }

    merged
}

// ============================================================================
// AGGREGATOR
// ============================================================================

pub struct ShoppingListAggregator<C, R> {
    cart: C,
    recipes: R,
}

impl<C: CartStore, R: RecipeStore> ShoppingListAggregator<C, R> {
    pub fn new(cart: C, recipes: R) -> Self {
        Self { cart, recipes }
    }

    /// Merged ingredient list for everything in the user's cart.
    ///
    /// Cart entries whose recipe has disappeared are skipped, not reported.
    /// Only storage failures are errors.
    pub fn aggregate(&self, user_id: UserId) -> AppResult<Vec<MergedLine>> {
        let recipe_ids = self.cart.list_carted_recipe_ids(user_id)?;

        let mut lines = Vec::new();
        for recipe_id in recipe_ids {
            let recipe_lines = self.recipes.get_ingredient_lines(recipe_id)?;
            if recipe_lines.is_empty() {
                debug!("Cart entry contributes nothing: user {user_id}, recipe {recipe_id}");
            }
            lines.extend(recipe_lines);
        }

        let merged = merge_lines(lines);
        debug!("Aggregated {} ingredients for user {user_id}", merged.len());
        Ok(merged)
    }
}

// ============================================================================
// SQLITE STORES
// ============================================================================

impl CartStore for ShoppingCart<'_> {
    fn list_carted_recipe_ids(&self, user_id: UserId) -> AppResult<Vec<RecipeId>> {
        self.recipe_ids(user_id)
    }
}

/// Recipe Store view over the recipe tables
pub struct SqliteRecipeStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteRecipeStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl RecipeStore for SqliteRecipeStore<'_> {
    fn get_ingredient_lines(&self, recipe_id: RecipeId) -> AppResult<Vec<IngredientLine>> {
        let lines = get_ingredient_lines(self.conn, recipe_id)?
            .into_iter()
            .map(|line| IngredientLine {
                name: line.name,
                measurement_unit: line.measurement_unit,
                amount: line.amount,
            })
            .collect();

        Ok(lines)
    }
}

/// Aggregate a user's cart straight from the database
pub fn shopping_list_for_user(conn: &Connection, user_id: UserId) -> AppResult<Vec<MergedLine>> {
    ShoppingListAggregator::new(ShoppingCart::new(conn), SqliteRecipeStore::new(conn)).aggregate(user_id)
}
