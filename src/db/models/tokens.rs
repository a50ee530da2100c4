//! Auth token operations
//!
//! Tokens are opaque UUID keys with get-or-create semantics: repeated logins
//! return the same key until logout deletes the row.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::Database;
use crate::models::{AuthToken, User};

impl Database {
    /// Fetch the user's token, creating one if none exists.
    ///
    /// `INSERT OR IGNORE` against UNIQUE(user_id) followed by a re-select
    /// keeps this idempotent even if two first logins race.
    pub fn get_or_create_token(&self, user_id: i64) -> SqliteResult<AuthToken> {
        let conn = self.conn.lock().unwrap();

        let key = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT OR IGNORE INTO auth_tokens (key, user_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![key, user_id, Utc::now().to_rfc3339()],
        )?;

        let mut stmt = conn.prepare(
            "SELECT key, user_id, created_at FROM auth_tokens WHERE user_id = ?1",
        )?;
        stmt.query_row([user_id], |row| {
            let created_at_str: String = row.get(2)?;
            Ok(AuthToken {
                key: row.get(0)?,
                user_id: row.get(1)?,
                created_at: Self::parse_timestamp(2, &created_at_str)?,
            })
        })
    }

    /// Resolve a token key to its user. Returns None for unknown keys.
    pub fn get_user_by_token(&self, key: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.email, u.password_hash, u.created_at
             FROM users u JOIN auth_tokens t ON t.user_id = u.id
             WHERE t.key = ?1",
        )?;

        stmt.query_row([key], Self::row_to_user).optional()
    }

    /// Delete a token (logout). Returns false if the key was not present.
    pub fn delete_token(&self, key: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute("DELETE FROM auth_tokens WHERE key = ?1", [key])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use tempfile::tempdir;

    #[test]
    fn test_token_get_or_create_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let user = db.create_user("alice", "a@x.com", "hash").unwrap();

        let first = db.get_or_create_token(user.id).unwrap();
        let second = db.get_or_create_token(user.id).unwrap();
        assert_eq!(first.key, second.key);
    }

    #[test]
    fn test_token_resolves_user_until_deleted() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let user = db.create_user("alice", "a@x.com", "hash").unwrap();
        let token = db.get_or_create_token(user.id).unwrap();

        let resolved = db.get_user_by_token(&token.key).unwrap().unwrap();
        assert_eq!(resolved.id, user.id);

        assert!(db.delete_token(&token.key).unwrap());
        assert!(db.get_user_by_token(&token.key).unwrap().is_none());

        // Second delete is a no-op
        assert!(!db.delete_token(&token.key).unwrap());
    }

    #[test]
    fn test_fresh_token_after_logout() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let user = db.create_user("alice", "a@x.com", "hash").unwrap();

        let first = db.get_or_create_token(user.id).unwrap();
        db.delete_token(&first.key).unwrap();
        let second = db.get_or_create_token(user.id).unwrap();
        assert_ne!(first.key, second.key);
    }
}
