pub mod auth;
pub mod health;
pub mod notes;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::models::User;
use crate::AppState;

/// Extract the token key from the Authorization header.
/// Accepts `Token <key>` (primary scheme) and `Bearer <key>`.
pub(crate) fn token_from_request(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| {
            h.strip_prefix("Token ")
                .or_else(|| h.strip_prefix("Bearer "))
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the authenticated user for a protected route.
pub(crate) fn authenticate(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<User, HttpResponse> {
    let key = match token_from_request(req) {
        Some(k) => k,
        None => {
            return Err(HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "No authorization token provided"
            })));
        }
    };

    match state.db.get_user_by_token(&key) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid or expired token"
        }))),
        Err(e) => {
            log::error!("Token validation error: {}", e);
            Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            })))
        }
    }
}
