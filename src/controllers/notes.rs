//! Notes REST API - owner-scoped CRUD and substring search.
//!
//! Every lookup goes through repository methods parameterised by the
//! authenticated owner, so a note under another owner reads as 404.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::models::{CreateNoteRequest, NoteResponse, UpdateNoteRequest, User};
use crate::models::note::MAX_TITLE_LEN;
use crate::AppState;

use super::authenticate;

#[derive(Debug, Deserialize)]
struct ListNotesQuery {
    q: Option<String>,
}

/// List the caller's notes, newest-updated first, optionally filtered by
/// a case-insensitive substring over title or content.
async fn list_notes(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListNotesQuery>,
) -> impl Responder {
    let user = match authenticate(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match data.db.list_notes(user.id, query.q.as_deref()) {
        Ok(notes) => {
            let body: Vec<NoteResponse> = notes.iter().map(NoteResponse::from).collect();
            HttpResponse::Ok().json(body)
        }
        Err(e) => {
            log::error!("Failed to list notes: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }))
        }
    }
}

/// Create a note owned by the caller. Any owner field in the payload is
/// ignored; the authenticated identity always wins.
async fn create_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateNoteRequest>,
) -> impl Responder {
    let user = match authenticate(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    if let Some(message) = validate_title(&body.title) {
        return HttpResponse::BadRequest().json(json!({ "title": [message] }));
    }

    let content = body.content.as_deref().unwrap_or("");
    match data.db.create_note(user.id, &body.title, content) {
        Ok(note) => HttpResponse::Created().json(NoteResponse::from(&note)),
        Err(e) => {
            log::error!("Failed to create note: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }))
        }
    }
}

async fn get_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    let user = match authenticate(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let note_id = path.into_inner();

    match data.db.get_note(user.id, note_id) {
        Ok(Some(note)) => HttpResponse::Ok().json(NoteResponse::from(&note)),
        Ok(None) => not_found(),
        Err(e) => {
            log::error!("Failed to get note: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }))
        }
    }
}

/// Full update: title is required, content keeps its value when omitted.
/// Identity is resolved before the payload is validated.
async fn put_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateNoteRequest>,
) -> impl Responder {
    let user = match authenticate(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    let title = match &body.title {
        Some(t) => t.as_str(),
        None => {
            return HttpResponse::BadRequest().json(json!({
                "title": ["This field is required."]
            }));
        }
    };

    apply_update(
        data,
        user,
        path.into_inner(),
        Some(title),
        body.content.as_deref(),
    )
}

/// Partial update: both fields optional; `updated_at` refreshes regardless.
async fn patch_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateNoteRequest>,
) -> impl Responder {
    let user = match authenticate(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    apply_update(
        data,
        user,
        path.into_inner(),
        body.title.as_deref(),
        body.content.as_deref(),
    )
}

fn apply_update(
    data: web::Data<AppState>,
    user: User,
    note_id: i64,
    title: Option<&str>,
    content: Option<&str>,
) -> HttpResponse {
    if let Some(t) = title {
        if let Some(message) = validate_title(t) {
            return HttpResponse::BadRequest().json(json!({ "title": [message] }));
        }
    }

    match data.db.update_note(user.id, note_id, title, content) {
        Ok(Some(note)) => HttpResponse::Ok().json(NoteResponse::from(&note)),
        Ok(None) => not_found(),
        Err(e) => {
            log::error!("Failed to update note: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }))
        }
    }
}

async fn delete_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> impl Responder {
    let user = match authenticate(&data, &req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let note_id = path.into_inner();

    match data.db.delete_note(user.id, note_id) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => not_found(),
        Err(e) => {
            log::error!("Failed to delete note: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }))
        }
    }
}

fn validate_title(title: &str) -> Option<&'static str> {
    if title.trim().is_empty() {
        Some("This field may not be blank.")
    } else if title.chars().count() > MAX_TITLE_LEN {
        Some("Ensure this field has no more than 255 characters.")
    } else {
        None
    }
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Not found." }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notes")
            .route("/", web::get().to(list_notes))
            .route("/", web::post().to(create_note))
            .route("/{id}/", web::get().to(get_note))
            .route("/{id}/", web::put().to(put_note))
            .route("/{id}/", web::patch().to(patch_note))
            .route("/{id}/", web::delete().to(delete_note)),
    );
}
