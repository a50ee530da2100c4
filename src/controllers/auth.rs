//! Auth REST API - registration, token login/logout, current user.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::{json, Map, Value};

use crate::auth::password;
use crate::models::{LoginRequest, RegisterRequest, UserResponse};
use crate::AppState;

use super::{authenticate, token_from_request};

const MAX_USERNAME_LEN: usize = 150;

/// Register a new user. Returns the user wire form on success, or a map of
/// per-field error messages with 400.
async fn register(data: web::Data<AppState>, body: web::Json<RegisterRequest>) -> impl Responder {
    let mut errors = Map::new();

    if body.username.trim().is_empty() {
        field_error(&mut errors, "username", "This field may not be blank.");
    } else if body.username.chars().count() > MAX_USERNAME_LEN {
        field_error(
            &mut errors,
            "username",
            "Ensure this field has no more than 150 characters.",
        );
    } else if !body
        .username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        field_error(
            &mut errors,
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    } else {
        match data.db.get_user_by_username(&body.username) {
            Ok(Some(_)) => field_error(
                &mut errors,
                "username",
                "A user with that username already exists.",
            ),
            Ok(None) => {}
            Err(e) => {
                log::error!("Failed to check username availability: {}", e);
                return HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }));
            }
        }
    }

    if body.email.trim().is_empty() {
        field_error(&mut errors, "email", "This field may not be blank.");
    } else if !body.email.contains('@') {
        field_error(&mut errors, "email", "Enter a valid email address.");
    }

    if body.password.is_empty() {
        field_error(&mut errors, "password", "This field may not be blank.");
    }

    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(Value::Object(errors));
    }

    let password_hash = match password::hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => {
            log::error!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }));
        }
    };

    match data
        .db
        .create_user(&body.username, &body.email, &password_hash)
    {
        Ok(user) => HttpResponse::Created().json(UserResponse::from(&user)),
        // Lost a race on the UNIQUE(username) constraint
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            HttpResponse::BadRequest().json(json!({
                "username": ["A user with that username already exists."]
            }))
        }
        Err(e) => {
            log::error!("Failed to create user: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }))
        }
    }
}

/// Check credentials and return the user's token (get-or-create, so
/// repeated logins yield the same key until logout).
async fn login(data: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    let mut errors = Map::new();
    if body.username.is_empty() {
        field_error(&mut errors, "username", "This field may not be blank.");
    }
    if body.password.is_empty() {
        field_error(&mut errors, "password", "This field may not be blank.");
    }
    if !errors.is_empty() {
        return HttpResponse::BadRequest().json(Value::Object(errors));
    }

    let user = match data.db.get_user_by_username(&body.username) {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::BadRequest().json(json!({
                "error": "Invalid Credentials"
            }));
        }
        Err(e) => {
            log::error!("Failed to look up user: {}", e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }));
        }
    };

    match password::verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::BadRequest().json(json!({
                "error": "Invalid Credentials"
            }));
        }
        Err(e) => {
            log::error!("Stored password hash unreadable for '{}': {}", user.username, e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }));
        }
    }

    match data.db.get_or_create_token(user.id) {
        Ok(token) => HttpResponse::Ok().json(json!({
            "token": token.key,
            "user": UserResponse::from(&user),
        })),
        Err(e) => {
            log::error!("Failed to issue token: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }))
        }
    }
}

/// Invalidate the caller's token.
async fn logout(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let key = match token_from_request(&req) {
        Some(k) => k,
        None => {
            return HttpResponse::Unauthorized().json(json!({
                "error": "No authorization token provided"
            }));
        }
    };

    match data.db.delete_token(&key) {
        Ok(true) => HttpResponse::Ok().json(json!({
            "message": "Logged out successfully."
        })),
        Ok(false) => HttpResponse::Unauthorized().json(json!({
            "error": "Invalid or expired token"
        })),
        Err(e) => {
            log::error!("Failed to delete token: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }))
        }
    }
}

/// Current user's profile.
async fn current_user(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match authenticate(&data, &req) {
        Ok(user) => HttpResponse::Ok().json(UserResponse::from(&user)),
        Err(resp) => resp,
    }
}

fn field_error(errors: &mut Map<String, Value>, field: &str, message: &str) {
    errors.insert(field.to_string(), json!([message]));
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register/", web::post().to(register))
            .route("/login/", web::post().to(login))
            .route("/logout/", web::post().to(logout))
            .route("/user/", web::get().to(current_user)),
    );
}
