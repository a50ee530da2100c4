use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. The password is only ever held as an Argon2id hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Opaque bearer token. At most one active token per user; the key is
/// a UUID v4 string issued on first login and deleted on logout.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub key: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Registration payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Wire form of a user. Deliberately excludes the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}
