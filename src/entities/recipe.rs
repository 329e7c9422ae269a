// 🍲 Recipe Entity - the Recipe Store
//
// A recipe owns its ingredient lines and tag links; both are replaced
// wholesale on update and removed with the recipe.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::ingredient::{get_ingredient, IngredientId};
use super::tag::{get_tag, tags_for_recipe, Tag, TagId};
use super::user::{get_user, UserId, UserView};
use crate::db::parse_timestamp;
use crate::error::{AppError, AppResult};

pub type RecipeId = i64;

/// Largest amount one ingredient line may carry (a 32-bit integer column)
pub const MAX_AMOUNT: i64 = i32::MAX as i64;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One ingredient of a recipe, joined with the catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeIngredientLine {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Ingredient reference inside a create/update payload
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmount {
    pub id: IngredientId,
    pub amount: i64,
}

/// Create/update payload
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeInput {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeInput {
    /// Payload checks that need the catalog: tags and ingredients must exist
    fn validate(&self, conn: &Connection) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Recipe name must be set"));
        }
        if self.cooking_time < 1 {
            return Err(AppError::validation("Cooking time must be at least 1 minute"));
        }
        if self.tags.is_empty() {
            return Err(AppError::validation("Tags must be set"));
        }
        if self.ingredients.is_empty() {
            return Err(AppError::validation("Ingredients must be set"));
        }

        for tag_id in &self.tags {
            get_tag(conn, *tag_id)?;
        }

        let mut seen = HashSet::new();
        for item in &self.ingredients {
            get_ingredient(conn, item.id)?;
            if !seen.insert(item.id) {
                return Err(AppError::validation("This ingredient is in list"));
            }
            if item.amount < 0 {
                return Err(AppError::validation("Amount must not be negative"));
            }
            if item.amount > MAX_AMOUNT {
                return Err(AppError::validation(format!("Amount must not exceed {MAX_AMOUNT}")));
            }
        }

        Ok(())
    }
}

/// Recipe as returned by the API, relative to a viewer
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: RecipeId,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientLine>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
}

/// Short form used by favorite / cart responses
#[derive(Debug, Clone, Serialize)]
pub struct MinRecipe {
    pub id: RecipeId,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i64,
}

impl From<Recipe> for MinRecipe {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

const RECIPE_COLUMNS: &str = "id, author_id, name, text, cooking_time, image, created_at";

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    let created_at: String = row.get(6)?;
    Ok(Recipe {
        id: row.get(0)?,
        author_id: row.get(1)?,
        name: row.get(2)?,
        text: row.get(3)?,
        cooking_time: row.get(4)?,
        image: row.get(5)?,
        created_at: parse_timestamp(6, &created_at)?,
    })
}

// ============================================================================
// READS
// ============================================================================

pub fn find_recipe(conn: &Connection, recipe_id: RecipeId) -> AppResult<Option<Recipe>> {
    let recipe = conn
        .query_row(
            &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1"),
            [recipe_id],
            recipe_from_row,
        )
        .optional()?;
    Ok(recipe)
}

pub fn get_recipe(conn: &Connection, recipe_id: RecipeId) -> AppResult<Recipe> {
    find_recipe(conn, recipe_id)?.ok_or_else(|| AppError::not_found("Recipe"))
}

/// All recipes ordered by name
pub fn list_recipes(conn: &Connection) -> AppResult<Vec<Recipe>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY name, id"
    ))?;
    let recipes = stmt
        .query_map([], recipe_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(recipes)
}

/// Ingredient lines of a recipe in insertion order.
/// A recipe that no longer exists simply has no lines.
pub fn get_ingredient_lines(
    conn: &Connection,
    recipe_id: RecipeId,
) -> AppResult<Vec<RecipeIngredientLine>> {
    let mut stmt = conn.prepare_cached(
        "SELECT i.id, i.name, i.measurement_unit, ri.amount
         FROM recipe_ingredients ri JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE ri.recipe_id = ?1
         ORDER BY ri.id",
    )?;

    let lines = stmt
        .query_map([recipe_id], |row| {
            Ok(RecipeIngredientLine {
                id: row.get(0)?,
                name: row.get(1)?,
                measurement_unit: row.get(2)?,
                amount: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(lines)
}

fn membership_flag(conn: &Connection, table: &str, user_id: UserId, recipe_id: RecipeId) -> AppResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE user_id = ?1 AND recipe_id = ?2"),
            params![user_id, recipe_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl RecipeView {
    pub fn build(conn: &Connection, recipe: Recipe, viewer: Option<UserId>) -> AppResult<Self> {
        let author = UserView::for_viewer(conn, get_user(conn, recipe.author_id)?, viewer)?;

        let (is_favorited, is_in_shopping_cart) = match viewer {
            Some(user_id) => (
                membership_flag(conn, "favorites", user_id, recipe.id)?,
                membership_flag(conn, "shopping_cart", user_id, recipe.id)?,
            ),
            None => (false, false),
        };

        Ok(RecipeView {
            id: recipe.id,
            tags: tags_for_recipe(conn, recipe.id)?,
            author,
            ingredients: get_ingredient_lines(conn, recipe.id)?,
            is_favorited,
            is_in_shopping_cart,
            image: recipe.image,
            name: recipe.name,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        })
    }
}

// ============================================================================
// WRITES
// ============================================================================

fn write_links(conn: &Connection, recipe_id: RecipeId, input: &RecipeInput) -> AppResult<()> {
    let mut tag_stmt =
        conn.prepare_cached("INSERT OR IGNORE INTO recipe_tags (recipe_id, tag_id) VALUES (?1, ?2)")?;
    for tag_id in &input.tags {
        tag_stmt.execute(params![recipe_id, tag_id])?;
    }

    let mut line_stmt = conn.prepare_cached(
        "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?1, ?2, ?3)",
    )?;
    for item in &input.ingredients {
        line_stmt.execute(params![recipe_id, item.id, item.amount])?;
    }

    Ok(())
}

pub fn create_recipe(conn: &Connection, author_id: UserId, input: &RecipeInput) -> AppResult<Recipe> {
    input.validate(conn)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO recipes (author_id, name, text, cooking_time, image, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            author_id,
            input.name,
            input.text,
            input.cooking_time,
            input.image,
            Utc::now().to_rfc3339(),
        ],
    )?;
    let recipe_id = tx.last_insert_rowid();
    write_links(&tx, recipe_id, input)?;
    tx.commit()?;

    get_recipe(conn, recipe_id)
}

fn ensure_author(conn: &Connection, user_id: UserId, recipe_id: RecipeId) -> AppResult<Recipe> {
    let recipe = get_recipe(conn, recipe_id)?;
    if recipe.author_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(recipe)
}

/// Replace a recipe's fields, tags and ingredient lines. Author only.
pub fn update_recipe(
    conn: &Connection,
    user_id: UserId,
    recipe_id: RecipeId,
    input: &RecipeInput,
) -> AppResult<Recipe> {
    ensure_author(conn, user_id, recipe_id)?;
    input.validate(conn)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE recipes SET name = ?1, text = ?2, cooking_time = ?3, image = COALESCE(?4, image)
         WHERE id = ?5",
        params![input.name, input.text, input.cooking_time, input.image, recipe_id],
    )?;
    tx.execute("DELETE FROM recipe_tags WHERE recipe_id = ?1", [recipe_id])?;
    tx.execute("DELETE FROM recipe_ingredients WHERE recipe_id = ?1", [recipe_id])?;
    write_links(&tx, recipe_id, input)?;
    tx.commit()?;

    get_recipe(conn, recipe_id)
}

/// Delete a recipe; lines, tag links, favorites and cart entries cascade. Author only.
pub fn delete_recipe(conn: &Connection, user_id: UserId, recipe_id: RecipeId) -> AppResult<()> {
    ensure_author(conn, user_id, recipe_id)?;
    conn.execute("DELETE FROM recipes WHERE id = ?1", [recipe_id])?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn recipe_input(name: &str, tags: Vec<TagId>, ingredients: &[(IngredientId, i64)]) -> RecipeInput {
    RecipeInput {
        name: name.to_string(),
        text: "Mix and cook".to_string(),
        cooking_time: 30,
        image: None,
        tags,
        ingredients: ingredients
            .iter()
            .map(|&(id, amount)| IngredientAmount { id, amount })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::entities::ingredient::create_test_ingredient;
    use crate::entities::tag::create_test_tag;
    use crate::entities::user::create_test_user;

    #[test]
    fn test_create_and_read_lines() {
        let conn = test_connection();
        let author = create_test_user(&conn, "ann");
        let tag = create_test_tag(&conn, "dinner");
        let flour = create_test_ingredient(&conn, "flour", "g");
        let milk = create_test_ingredient(&conn, "milk", "ml");

        let recipe = create_recipe(
            &conn,
            author.id,
            &recipe_input("Pancakes", vec![tag.id], &[(flour.id, 200), (milk.id, 300)]),
        )
        .unwrap();

        let lines = get_ingredient_lines(&conn, recipe.id).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "flour");
        assert_eq!(lines[0].amount, 200);
        assert_eq!(lines[1].measurement_unit, "ml");
    }

    #[test]
    fn test_validation_rules() {
        let conn = test_connection();
        let author = create_test_user(&conn, "ann");
        let tag = create_test_tag(&conn, "dinner");
        let flour = create_test_ingredient(&conn, "flour", "g");

        let cases = vec![
            recipe_input("No tags", vec![], &[(flour.id, 1)]),
            recipe_input("No ingredients", vec![tag.id], &[]),
            recipe_input("Duplicate", vec![tag.id], &[(flour.id, 1), (flour.id, 2)]),
            recipe_input("Negative", vec![tag.id], &[(flour.id, -1)]),
            recipe_input("", vec![tag.id], &[(flour.id, 1)]),
        ];

        for input in cases {
            let result = create_recipe(&conn, author.id, &input);
            assert!(
                matches!(result, Err(AppError::Validation(_))),
                "expected validation error for {:?}",
                input.name
            );
        }

        let mut slow = recipe_input("Zero time", vec![tag.id], &[(flour.id, 1)]);
        slow.cooking_time = 0;
        assert!(matches!(create_recipe(&conn, author.id, &slow), Err(AppError::Validation(_))));

        let unknown = recipe_input("Unknown", vec![tag.id], &[(999, 1)]);
        assert!(matches!(create_recipe(&conn, author.id, &unknown), Err(AppError::NotFound(_))));

        assert!(list_recipes(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_zero_amount_is_allowed() {
        let conn = test_connection();
        let author = create_test_user(&conn, "ann");
        let tag = create_test_tag(&conn, "dinner");
        let salt = create_test_ingredient(&conn, "salt", "pinch");

        let recipe = create_recipe(&conn, author.id, &recipe_input("Plain", vec![tag.id], &[(salt.id, 0)]))
            .unwrap();
        assert_eq!(get_ingredient_lines(&conn, recipe.id).unwrap()[0].amount, 0);
    }

    #[test]
    fn test_amount_upper_bound() {
        let conn = test_connection();
        let author = create_test_user(&conn, "ann");
        let tag = create_test_tag(&conn, "dinner");
        let salt = create_test_ingredient(&conn, "salt", "g");

        let at_limit = recipe_input("Salty", vec![tag.id], &[(salt.id, MAX_AMOUNT)]);
        let recipe = create_recipe(&conn, author.id, &at_limit).unwrap();
        assert_eq!(get_ingredient_lines(&conn, recipe.id).unwrap()[0].amount, MAX_AMOUNT);

        let too_much = recipe_input("Saltier", vec![tag.id], &[(salt.id, MAX_AMOUNT + 1)]);
        assert!(matches!(
            create_recipe(&conn, author.id, &too_much),
            Err(AppError::Validation(_))
        ));
        let huge = recipe_input("Saltiest", vec![tag.id], &[(salt.id, i64::MAX)]);
        assert!(matches!(
            create_recipe(&conn, author.id, &huge),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_update_replaces_lines() {
        let conn = test_connection();
        let author = create_test_user(&conn, "ann");
        let tag = create_test_tag(&conn, "dinner");
        let flour = create_test_ingredient(&conn, "flour", "g");
        let sugar = create_test_ingredient(&conn, "sugar", "g");

        let recipe = create_recipe(&conn, author.id, &recipe_input("Cake", vec![tag.id], &[(flour.id, 100)]))
            .unwrap();
        update_recipe(
            &conn,
            author.id,
            recipe.id,
            &recipe_input("Cake v2", vec![tag.id], &[(sugar.id, 50)]),
        )
        .unwrap();

        let lines = get_ingredient_lines(&conn, recipe.id).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "sugar");
        assert_eq!(get_recipe(&conn, recipe.id).unwrap().name, "Cake v2");
    }

    #[test]
    fn test_only_author_can_modify() {
        let conn = test_connection();
        let author = create_test_user(&conn, "ann");
        let other = create_test_user(&conn, "bob");
        let tag = create_test_tag(&conn, "dinner");
        let flour = create_test_ingredient(&conn, "flour", "g");

        let recipe = create_recipe(&conn, author.id, &recipe_input("Bread", vec![tag.id], &[(flour.id, 500)]))
            .unwrap();

        assert!(matches!(delete_recipe(&conn, other.id, recipe.id), Err(AppError::Forbidden)));
        delete_recipe(&conn, author.id, recipe.id).unwrap();

        assert!(find_recipe(&conn, recipe.id).unwrap().is_none());
        assert!(get_ingredient_lines(&conn, recipe.id).unwrap().is_empty());
    }

    #[test]
    fn test_view_for_anonymous_viewer() {
        let conn = test_connection();
        let author = create_test_user(&conn, "ann");
        let tag = create_test_tag(&conn, "dinner");
        let flour = create_test_ingredient(&conn, "flour", "g");

        let recipe = create_recipe(&conn, author.id, &recipe_input("Bread", vec![tag.id], &[(flour.id, 500)]))
            .unwrap();
        conn.execute(
            "INSERT INTO shopping_cart (user_id, recipe_id) VALUES (?1, ?2)",
            params![author.id, recipe.id],
        )
        .unwrap();

        let anonymous = RecipeView::build(&conn, recipe.clone(), None).unwrap();
        let owner = RecipeView::build(&conn, recipe, Some(author.id)).unwrap();

        assert!(!anonymous.is_in_shopping_cart);
        assert!(owner.is_in_shopping_cart);
        assert!(!owner.is_favorited);
        assert_eq!(owner.tags[0].slug, "dinner");
        assert_eq!(owner.author.username, "ann");
    }
}
