//! Note table operations
//!
//! Every query is parameterised by owner id. There is no unscoped lookup:
//! a note belonging to another user is indistinguishable from one that
//! does not exist.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

use super::super::Database;
use crate::models::Note;

const NOTE_COLUMNS: &str = "id, title, content, created_at, updated_at, owner_id";

impl Database {
    /// List a user's notes, most recently updated first. An optional search
    /// string filters to notes whose title or content contains it as a
    /// case-insensitive substring.
    pub fn list_notes(&self, owner_id: i64, query: Option<&str>) -> SqliteResult<Vec<Note>> {
        let conn = self.conn.lock().unwrap();

        match query.filter(|q| !q.is_empty()) {
            Some(q) => {
                let needle = format!("%{}%", escape_like(&q.to_lowercase()));
                let mut stmt = conn.prepare(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes
                     WHERE owner_id = ?1
                       AND (LOWER(title) LIKE ?2 ESCAPE '\\'
                            OR LOWER(content) LIKE ?2 ESCAPE '\\')
                     ORDER BY updated_at DESC"
                ))?;
                let notes = stmt
                    .query_map(params![owner_id, needle], Self::row_to_note)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                Ok(notes)
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes
                     WHERE owner_id = ?1 ORDER BY updated_at DESC"
                ))?;
                let notes = stmt
                    .query_map([owner_id], Self::row_to_note)?
                    .collect::<SqliteResult<Vec<_>>>()?;
                Ok(notes)
            }
        }
    }

    pub fn create_note(&self, owner_id: i64, title: &str, content: &str) -> SqliteResult<Note> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        conn.execute(
            "INSERT INTO notes (title, content, created_at, updated_at, owner_id)
             VALUES (?1, ?2, ?3, ?3, ?4)",
            params![title, content, now_str, owner_id],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
            owner_id,
        })
    }

    pub fn get_note(&self, owner_id: i64, id: i64) -> SqliteResult<Option<Note>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND owner_id = ?2"
        ))?;

        stmt.query_row(params![id, owner_id], Self::row_to_note)
            .optional()
    }

    /// Apply new title/content to an owned note, refreshing `updated_at`.
    /// Fields passed as None keep their current value. Returns None if the
    /// note does not exist under this owner.
    pub fn update_note(
        &self,
        owner_id: i64,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
    ) -> SqliteResult<Option<Note>> {
        let conn = self.conn.lock().unwrap();
        let updated_at = Utc::now();

        let rows_affected = conn.execute(
            "UPDATE notes
             SET title = COALESCE(?1, title),
                 content = COALESCE(?2, content),
                 updated_at = ?3
             WHERE id = ?4 AND owner_id = ?5",
            params![title, content, updated_at.to_rfc3339(), id, owner_id],
        )?;

        if rows_affected == 0 {
            return Ok(None);
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND owner_id = ?2"
        ))?;
        stmt.query_row(params![id, owner_id], Self::row_to_note)
            .optional()
    }

    /// Delete an owned note. Returns false if nothing was deleted, which
    /// the caller surfaces as not-found.
    pub fn delete_note(&self, owner_id: i64, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(rows_affected > 0)
    }

    fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
        let created_at_str: String = row.get(3)?;
        let updated_at_str: String = row.get(4)?;

        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            created_at: Self::parse_timestamp(3, &created_at_str)?,
            updated_at: Self::parse_timestamp(4, &updated_at_str)?,
            owner_id: row.get(5)?,
        })
    }
}

/// Escape LIKE wildcards so a search string is matched literally.
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;
    use crate::db::Database;
    use tempfile::tempdir;

    fn test_db(dir: &tempfile::TempDir) -> Database {
        Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_create_and_get_note() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir);
        let user = db.create_user("alice", "a@x.com", "hash").unwrap();

        let note = db.create_note(user.id, "Hi", "").unwrap();
        assert_eq!(note.owner_id, user.id);
        assert_eq!(note.content, "");
        assert_eq!(note.created_at, note.updated_at);

        let fetched = db.get_note(user.id, note.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Hi");
    }

    #[test]
    fn test_notes_are_owner_scoped() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir);
        let alice = db.create_user("alice", "a@x.com", "hash").unwrap();
        let bob = db.create_user("bob", "b@x.com", "hash").unwrap();

        let note = db.create_note(alice.id, "Secret", "mine").unwrap();

        assert!(db.get_note(bob.id, note.id).unwrap().is_none());
        assert!(db.list_notes(bob.id, None).unwrap().is_empty());
        assert!(!db.delete_note(bob.id, note.id).unwrap());
        assert!(db
            .update_note(bob.id, note.id, Some("stolen"), None)
            .unwrap()
            .is_none());

        // Alice's note untouched by Bob's attempts
        let still_there = db.get_note(alice.id, note.id).unwrap().unwrap();
        assert_eq!(still_there.title, "Secret");
    }

    #[test]
    fn test_update_refreshes_updated_at_only() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir);
        let user = db.create_user("alice", "a@x.com", "hash").unwrap();
        let note = db.create_note(user.id, "Draft", "v1").unwrap();

        let updated = db
            .update_note(user.id, note.id, None, Some("v2"))
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Draft");
        assert_eq!(updated.content, "v2");
        assert_eq!(updated.created_at, note.created_at);
        assert_eq!(updated.owner_id, note.owner_id);
        assert!(updated.updated_at >= note.updated_at);
    }

    #[test]
    fn test_list_ordered_by_updated_at_desc() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir);
        let user = db.create_user("alice", "a@x.com", "hash").unwrap();

        let first = db.create_note(user.id, "first", "").unwrap();
        let _second = db.create_note(user.id, "second", "").unwrap();

        // Touching the older note moves it to the front
        std::thread::sleep(std::time::Duration::from_millis(5));
        db.update_note(user.id, first.id, None, Some("touched"))
            .unwrap();

        let notes = db.list_notes(user.id, None).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, first.id);
    }

    #[test]
    fn test_search_case_insensitive_substring() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir);
        let user = db.create_user("alice", "a@x.com", "hash").unwrap();

        db.create_note(user.id, "Grocery List", "milk, eggs").unwrap();
        db.create_note(user.id, "Workout", "remember the GROCERIES after").unwrap();
        db.create_note(user.id, "Unrelated", "nothing here").unwrap();

        let by_title = db.list_notes(user.id, Some("grocery")).unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "Grocery List");

        let by_content = db.list_notes(user.id, Some("groceries")).unwrap();
        assert_eq!(by_content.len(), 1);
        assert_eq!(by_content[0].title, "Workout");

        assert!(db.list_notes(user.id, Some("xyzzy")).unwrap().is_empty());
    }

    #[test]
    fn test_search_wildcards_matched_literally() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir);
        let user = db.create_user("alice", "a@x.com", "hash").unwrap();

        db.create_note(user.id, "Discount", "100% off").unwrap();
        db.create_note(user.id, "Other", "no percent sign").unwrap();

        let results = db.list_notes(user.id, Some("100%")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Discount");
    }

    #[test]
    fn test_delete_note_idempotent_failure() {
        let dir = tempdir().unwrap();
        let db = test_db(&dir);
        let user = db.create_user("alice", "a@x.com", "hash").unwrap();
        let note = db.create_note(user.id, "gone soon", "").unwrap();

        assert!(db.delete_note(user.id, note.id).unwrap());
        assert!(!db.delete_note(user.id, note.id).unwrap());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_done\\x"), "50\\%\\_done\\\\x");
        assert_eq!(escape_like("plain"), "plain");
    }
}
