use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum title length, matching the 255-char column limit.
pub const MAX_TITLE_LEN: usize = 255;

/// A note record. `created_at` and `owner_id` never change after creation;
/// `updated_at` is refreshed on every mutation.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: i64,
}

/// Create payload. Any client-supplied owner or timestamp fields are
/// ignored by deserialization - the handler fills them in server-side.
#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    pub content: Option<String>,
}

/// Update payload for PUT (title required) and PATCH (both optional).
#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Wire form of a note. The id, timestamps, and owner are read-only from
/// the client's perspective; they only ever flow server -> client.
#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: i64,
}

impl From<&Note> for NoteResponse {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            created_at: note.created_at,
            updated_at: note.updated_at,
            owner: note.owner_id,
        }
    }
}
