// 🔗 Membership Relations - favorites, shopping cart, follows
//
// Three owner → target relations with identical semantics. Each one is its
// own type implementing the same small capability trait.

use rusqlite::{params, Connection, OptionalExtension};

use crate::entities::recipe::{find_recipe, RecipeId};
use crate::entities::user::{get_user, UserId};
use crate::error::{AppError, AppResult};

/// add / remove / exists on a unique (owner, target) pair
pub trait MembershipRelation {
    /// Human-readable name of the target, used in error messages
    fn target_label(&self) -> &'static str;

    fn add(&self, owner_id: i64, target_id: i64) -> AppResult<()>;

    fn remove(&self, owner_id: i64, target_id: i64) -> AppResult<()>;

    fn exists(&self, owner_id: i64, target_id: i64) -> AppResult<bool>;
}

// ============================================================================
// SHARED TABLE LOGIC
// ============================================================================

/// A two-column membership table
struct PairTable {
    table: &'static str,
    owner_column: &'static str,
    target_column: &'static str,
}

impl PairTable {
    fn exists(&self, conn: &Connection, owner_id: i64, target_id: i64) -> AppResult<bool> {
        let found: Option<i64> = conn
            .query_row(
                &format!(
                    "SELECT 1 FROM {} WHERE {} = ?1 AND {} = ?2",
                    self.table, self.owner_column, self.target_column
                ),
                params![owner_id, target_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// The UNIQUE (owner, target) constraint decides duplicates in one statement
    fn insert(&self, conn: &Connection, label: &str, owner_id: i64, target_id: i64) -> AppResult<()> {
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
                self.table, self.owner_column, self.target_column
            ),
            params![owner_id, target_id],
        )?;
        if inserted == 0 {
            return Err(AppError::AlreadyMember(label.to_string()));
        }
        Ok(())
    }

    fn delete(&self, conn: &Connection, label: &str, owner_id: i64, target_id: i64) -> AppResult<()> {
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
                self.table, self.owner_column, self.target_column
            ),
            params![owner_id, target_id],
        )?;
        if removed == 0 {
            return Err(AppError::NotMember(label.to_string()));
        }
        Ok(())
    }

    /// Targets of one owner in insertion order
    fn targets(&self, conn: &Connection, owner_id: i64) -> AppResult<Vec<i64>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY id",
            self.target_column, self.table, self.owner_column
        ))?;
        let ids = stmt
            .query_map([owner_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

const RECIPE_LABEL: &str = "Recipe";

/// Shared `add` for the user → recipe relations
fn add_recipe(table: &PairTable, conn: &Connection, user_id: UserId, recipe_id: RecipeId) -> AppResult<()> {
    if find_recipe(conn, recipe_id)?.is_none() {
        return Err(AppError::not_found(RECIPE_LABEL));
    }
    table.insert(conn, RECIPE_LABEL, user_id, recipe_id)
}

// ============================================================================
// FAVORITES
// ============================================================================

pub struct Favorites<'c> {
    conn: &'c Connection,
}

const FAVORITES: PairTable = PairTable {
    table: "favorites",
    owner_column: "user_id",
    target_column: "recipe_id",
};

impl<'c> Favorites<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl MembershipRelation for Favorites<'_> {
    fn target_label(&self) -> &'static str {
        RECIPE_LABEL
    }

    fn add(&self, user_id: UserId, recipe_id: RecipeId) -> AppResult<()> {
        add_recipe(&FAVORITES, self.conn, user_id, recipe_id)
    }

    fn remove(&self, user_id: UserId, recipe_id: RecipeId) -> AppResult<()> {
        FAVORITES.delete(self.conn, self.target_label(), user_id, recipe_id)
    }

    fn exists(&self, user_id: UserId, recipe_id: RecipeId) -> AppResult<bool> {
        FAVORITES.exists(self.conn, user_id, recipe_id)
    }
}

// ============================================================================
// SHOPPING CART
// ============================================================================

/// Cart entries: pure (user, recipe) references, no copied ingredient data
pub struct ShoppingCart<'c> {
    conn: &'c Connection,
}

const SHOPPING_CART: PairTable = PairTable {
    table: "shopping_cart",
    owner_column: "user_id",
    target_column: "recipe_id",
};

impl<'c> ShoppingCart<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Recipe ids in the user's cart, in the order they were added
    pub fn recipe_ids(&self, user_id: UserId) -> AppResult<Vec<RecipeId>> {
        SHOPPING_CART.targets(self.conn, user_id)
    }
}

impl MembershipRelation for ShoppingCart<'_> {
    fn target_label(&self) -> &'static str {
        RECIPE_LABEL
    }

    fn add(&self, user_id: UserId, recipe_id: RecipeId) -> AppResult<()> {
        add_recipe(&SHOPPING_CART, self.conn, user_id, recipe_id)
    }

    fn remove(&self, user_id: UserId, recipe_id: RecipeId) -> AppResult<()> {
        SHOPPING_CART.delete(self.conn, self.target_label(), user_id, recipe_id)
    }

    fn exists(&self, user_id: UserId, recipe_id: RecipeId) -> AppResult<bool> {
        SHOPPING_CART.exists(self.conn, user_id, recipe_id)
    }
}

// ============================================================================
// FOLLOWS
// ============================================================================

pub struct Follows<'c> {
    conn: &'c Connection,
}

const FOLLOWS: PairTable = PairTable {
    table: "follows",
    owner_column: "user_id",
    target_column: "author_id",
};

impl<'c> Follows<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Authors the user follows, most recent first
    pub fn authors(&self, user_id: UserId) -> AppResult<Vec<UserId>> {
        let mut ids = FOLLOWS.targets(self.conn, user_id)?;
        ids.reverse();
        Ok(ids)
    }
}

impl MembershipRelation for Follows<'_> {
    fn target_label(&self) -> &'static str {
        "Author"
    }

    fn add(&self, user_id: UserId, author_id: UserId) -> AppResult<()> {
        if user_id == author_id {
            return Err(AppError::validation("You can not subscribe to yourself"));
        }
        get_user(self.conn, author_id)?;
        FOLLOWS.insert(self.conn, self.target_label(), user_id, author_id)
    }

    fn remove(&self, user_id: UserId, author_id: UserId) -> AppResult<()> {
        FOLLOWS.delete(self.conn, self.target_label(), user_id, author_id)
    }

    fn exists(&self, user_id: UserId, author_id: UserId) -> AppResult<bool> {
        FOLLOWS.exists(self.conn, user_id, author_id)
    }
}
