pub mod note;
pub mod user;

pub use note::{CreateNoteRequest, Note, NoteResponse, UpdateNoteRequest};
pub use user::{AuthToken, LoginRequest, RegisterRequest, User, UserResponse};
