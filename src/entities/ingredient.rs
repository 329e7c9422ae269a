// 🥕 Ingredient Catalog - canonical (name, measurement_unit) pairs
//
// Reference data: loaded once from CSV, read by recipes and the shopping list.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, AppResult};

pub type IngredientId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

/// One CSV row: `name,measurement_unit`
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

fn ingredient_from_row(row: &Row<'_>) -> rusqlite::Result<Ingredient> {
    Ok(Ingredient {
        id: row.get(0)?,
        name: row.get(1)?,
        measurement_unit: row.get(2)?,
    })
}

pub fn get_ingredient(conn: &Connection, ingredient_id: IngredientId) -> AppResult<Ingredient> {
    conn.query_row(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = ?1",
        [ingredient_id],
        ingredient_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Ingredient"))
}

/// Ingredients whose name starts with `prefix` (case-insensitive), by name.
/// An empty prefix lists the whole catalog.
pub fn search_ingredients(conn: &Connection, prefix: &str) -> AppResult<Vec<Ingredient>> {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = format!("{escaped}%");

    let mut stmt = conn.prepare(
        "SELECT id, name, measurement_unit FROM ingredients
         WHERE name LIKE ?1 ESCAPE '\\'
         ORDER BY name, measurement_unit",
    )?;
    let ingredients = stmt
        .query_map([pattern], ingredient_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ingredients)
}

/// Insert catalog rows, ignoring pairs that already exist. Returns inserted count.
pub fn insert_ingredients(conn: &Connection, records: &[IngredientRecord]) -> Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO ingredients (name, measurement_unit) VALUES (?1, ?2)",
    )?;

    let mut inserted = 0;
    for record in records {
        if record.name.trim().is_empty() {
            debug!("Skipping ingredient with empty name");
            continue;
        }
        inserted += stmt.execute(params![record.name.trim(), record.measurement_unit.trim()])?;
    }

    Ok(inserted)
}

/// Load the catalog from a headerless `name,measurement_unit` CSV file
pub fn import_ingredients_csv(conn: &Connection, csv_path: &Path) -> Result<usize> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(csv_path)
        .context("Failed to open CSV file")?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: IngredientRecord = result.context("Failed to deserialize ingredient")?;
        records.push(record);
    }

    insert_ingredients(conn, &records)
}

#[cfg(test)]
pub(crate) fn create_test_ingredient(conn: &Connection, name: &str, unit: &str) -> Ingredient {
    conn.execute(
        "INSERT INTO ingredients (name, measurement_unit) VALUES (?1, ?2)",
        params![name, unit],
    )
    .unwrap();
    get_ingredient(conn, conn.last_insert_rowid()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;

    fn record(name: &str, unit: &str) -> IngredientRecord {
        IngredientRecord {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        }
    }

    #[test]
    fn test_same_name_different_unit_are_distinct() {
        let conn = test_connection();
        let inserted = insert_ingredients(
            &conn,
            &[record("sugar", "g"), record("sugar", "kg"), record("sugar", "g")],
        )
        .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(search_ingredients(&conn, "sugar").unwrap().len(), 2);
    }

    #[test]
    fn test_search_by_prefix() {
        let conn = test_connection();
        insert_ingredients(
            &conn,
            &[record("flour", "g"), record("Fish sauce", "ml"), record("salt", "g")],
        )
        .unwrap();

        let names: Vec<String> = search_ingredients(&conn, "f")
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();

        assert_eq!(names, vec!["Fish sauce", "flour"]);
        assert_eq!(search_ingredients(&conn, "").unwrap().len(), 3);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let conn = test_connection();
        insert_ingredients(&conn, &[record("salt", "g")]).unwrap();
        assert!(search_ingredients(&conn, "%").unwrap().is_empty());
    }

    #[test]
    fn test_import_csv() {
        let conn = test_connection();
        let path = std::env::temp_dir().join(format!("ingredients-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, "flour,g\nmilk,ml\nflour,g\n").unwrap();

        let inserted = import_ingredients_csv(&conn, &path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(inserted, 2);
    }
}
