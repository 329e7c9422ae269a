// 👤 User Entity - accounts, passwords and API tokens
//
// Authentication is a collaborator of the shopping list core: the API resolves
// a token to a user id once, and every downstream operation takes that id as
// an explicit parameter.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::parse_timestamp;
use crate::error::{AppError, AppResult};

pub type UserId = i64;

// ============================================================================
// USER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl NewUser {
    fn validate(&self) -> AppResult<()> {
        let required = [
            ("email", &self.email),
            ("username", &self.username),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("password", &self.password),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("Field '{field}' is required")));
            }
        }

        if !self.email.contains('@') {
            return Err(AppError::validation("Enter a valid email address"));
        }

        // "me" would shadow the /users/me/ endpoint
        if self.username == "me" {
            return Err(AppError::validation("User 'me' can not be created"));
        }

        Ok(())
    }
}

/// User as seen by another (possibly anonymous) user
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn for_viewer(conn: &Connection, user: User, viewer: Option<UserId>) -> AppResult<Self> {
        let is_subscribed = match viewer {
            Some(viewer_id) => is_following(conn, viewer_id, user.id)?,
            None => false,
        };

        Ok(UserView {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        })
    }
}

fn is_following(conn: &Connection, user_id: UserId, author_id: UserId) -> AppResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM follows WHERE user_id = ?1 AND author_id = ?2",
            params![user_id, author_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let date_joined: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        date_joined: parse_timestamp(5, &date_joined)?,
    })
}

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, date_joined";

// ============================================================================
// PASSWORDS
// ============================================================================

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{}${:x}", salt, hasher.finalize())
}

fn make_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    hash_password(&salt, password)
}

fn check_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, _)) => hash_password(salt, password) == stored,
        None => false,
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

pub fn register_user(conn: &Connection, new_user: &NewUser) -> AppResult<User> {
    new_user.validate()?;

    let taken: Option<String> = conn
        .query_row(
            "SELECT CASE WHEN email = ?1 THEN 'email' ELSE 'username' END
             FROM users WHERE email = ?1 OR username = ?2 LIMIT 1",
            params![new_user.email, new_user.username],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(field) = taken {
        return Err(AppError::validation(format!(
            "A user with that {field} already exists"
        )));
    }

    let now = Utc::now();
    conn.execute(
        "INSERT INTO users (email, username, first_name, last_name, password, date_joined)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            new_user.email,
            new_user.username,
            new_user.first_name,
            new_user.last_name,
            make_password(&new_user.password),
            now.to_rfc3339(),
        ],
    )?;

    get_user(conn, conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, user_id: UserId) -> AppResult<User> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [user_id],
        user_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("User"))
}

/// All users, newest first
pub fn list_users(conn: &Connection) -> AppResult<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY date_joined DESC, id DESC"
    ))?;

    let users = stmt
        .query_map([], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(users)
}

/// Check email + password, returning the matching user
pub fn authenticate(conn: &Connection, email: &str, password: &str) -> AppResult<User> {
    let stored: Option<(UserId, String)> = conn
        .query_row(
            "SELECT id, password FROM users WHERE email = ?1",
            [email],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match stored {
        Some((id, hash)) if check_password(&hash, password) => get_user(conn, id),
        _ => Err(AppError::NotAuthenticated),
    }
}

pub fn set_password(
    conn: &Connection,
    user_id: UserId,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    let stored: String = conn
        .query_row("SELECT password FROM users WHERE id = ?1", [user_id], |row| {
            row.get(0)
        })
        .optional()?
        .ok_or_else(|| AppError::not_found("User"))?;

    if !check_password(&stored, current_password) {
        return Err(AppError::validation("Current password is incorrect"));
    }
    if new_password.trim().is_empty() {
        return Err(AppError::validation("Field 'new_password' is required"));
    }

    conn.execute(
        "UPDATE users SET password = ?1 WHERE id = ?2",
        params![make_password(new_password), user_id],
    )?;

    Ok(())
}

// ============================================================================
// TOKENS
// ============================================================================

pub fn issue_token(conn: &Connection, user_id: UserId) -> AppResult<String> {
    let key = uuid::Uuid::new_v4().simple().to_string();
    conn.execute(
        "INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?1, ?2, ?3)",
        params![key, user_id, Utc::now().to_rfc3339()],
    )?;
    Ok(key)
}

pub fn revoke_token(conn: &Connection, key: &str) -> AppResult<()> {
    conn.execute("DELETE FROM auth_tokens WHERE key = ?1", [key])?;
    Ok(())
}

pub fn user_for_token(conn: &Connection, key: &str) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.date_joined
             FROM auth_tokens t JOIN users u ON u.id = t.user_id
             WHERE t.key = ?1",
            [key],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> AppResult<User> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        [email],
        user_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("User"))
}

#[cfg(test)]
pub(crate) fn create_test_user(conn: &Connection, username: &str) -> User {
    register_user(
        conn,
        &NewUser {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password: "secret-pass".to_string(),
        },
    )
    .unwrap()
}
