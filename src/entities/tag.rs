// 🏷️ Tag Entity - recipe labels (breakfast, lunch, ...)

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{AppError, AppResult};

pub type TagId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Tag as found in the JSON fixture file
#[derive(Debug, Clone, Deserialize)]
pub struct TagRecord {
    pub name: String,
    pub color: String,
    pub slug: String,
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        slug: row.get(3)?,
    })
}

pub fn list_tags(conn: &Connection) -> AppResult<Vec<Tag>> {
    let mut stmt = conn.prepare("SELECT id, name, color, slug FROM tags ORDER BY slug")?;
    let tags = stmt
        .query_map([], tag_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

pub fn get_tag(conn: &Connection, tag_id: TagId) -> AppResult<Tag> {
    conn.query_row(
        "SELECT id, name, color, slug FROM tags WHERE id = ?1",
        [tag_id],
        tag_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Tag"))
}

/// Tags attached to a recipe, ordered by slug
pub fn tags_for_recipe(conn: &Connection, recipe_id: i64) -> AppResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.color, t.slug
         FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id
         WHERE rt.recipe_id = ?1
         ORDER BY t.slug",
    )?;
    let tags = stmt
        .query_map([recipe_id], tag_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

/// Insert tags, skipping slugs that already exist. Returns how many were inserted.
pub fn insert_tags(conn: &Connection, records: &[TagRecord]) -> Result<usize> {
    let mut inserted = 0;

    for tag in records {
        let result = conn.execute(
            "INSERT INTO tags (name, color, slug) VALUES (?1, ?2, ?3)",
            params![tag.name, tag.color, tag.slug],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                warn!("Tag {} {} {} is already in db", tag.name, tag.color, tag.slug);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(inserted)
}

/// Load tags from a JSON array of `{name, color, slug}` objects
pub fn load_tags_json(conn: &Connection, path: &Path) -> Result<usize> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Tag file not found: {}", path.display()))?;
    let records: Vec<TagRecord> =
        serde_json::from_str(&raw).context("Failed to parse tag JSON")?;
    insert_tags(conn, &records)
}

#[cfg(test)]
pub(crate) fn create_test_tag(conn: &Connection, slug: &str) -> Tag {
    conn.execute(
        "INSERT INTO tags (name, color, slug) VALUES (?1, '#E26C2D', ?1)",
        [slug],
    )
    .unwrap();
    get_tag(conn, conn.last_insert_rowid()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;

    fn record(slug: &str) -> TagRecord {
        TagRecord {
            name: slug.to_uppercase(),
            color: "#49B64E".to_string(),
            slug: slug.to_string(),
        }
    }

    #[test]
    fn test_insert_skips_duplicates() {
        let conn = test_connection();

        let first = insert_tags(&conn, &[record("lunch"), record("breakfast")]).unwrap();
        let second = insert_tags(&conn, &[record("lunch"), record("dinner")]).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 1);

        let slugs: Vec<String> = list_tags(&conn).unwrap().into_iter().map(|t| t.slug).collect();
        assert_eq!(slugs, vec!["breakfast", "dinner", "lunch"]);
    }

    #[test]
    fn test_missing_tag_is_not_found() {
        let conn = test_connection();
        assert!(matches!(get_tag(&conn, 42), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let conn = test_connection();
        let result = load_tags_json(&conn, Path::new("/definitely/not/here/tags.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_json_file() {
        let conn = test_connection();
        let path = std::env::temp_dir().join(format!("tags-{}.json", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            r##"[{"name": "Breakfast", "color": "#E26C2D", "slug": "breakfast"}]"##,
        )
        .unwrap();

        let inserted = load_tags_json(&conn, &path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(list_tags(&conn).unwrap()[0].name, "Breakfast");
    }
}
