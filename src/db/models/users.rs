//! User table operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

use super::super::Database;
use crate::models::User;

impl Database {
    /// Insert a new user. The caller is responsible for hashing the password
    /// and for checking username availability first; the UNIQUE constraint
    /// is the backstop.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> SqliteResult<User> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, email, password_hash, created_at.to_rfc3339()],
        )?;

        let id = conn.last_insert_rowid();

        Ok(User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE username = ?1",
        )?;

        stmt.query_row([username], Self::row_to_user).optional()
    }

    pub fn get_user_by_id(&self, id: i64) -> SqliteResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE id = ?1",
        )?;

        stmt.query_row([id], Self::row_to_user).optional()
    }

    pub(crate) fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        let created_at_str: String = row.get(4)?;

        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: Self::parse_timestamp(4, &created_at_str)?,
        })
    }
}
