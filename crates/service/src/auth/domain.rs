use models::user::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Resolved acting user, passed explicitly into every core operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Stored account as the repository sees it (credential included).
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub password_hash: String,
}

impl StoredUser {
    pub fn identity(&self) -> Identity {
        Identity { id: self.id, username: self.username.clone(), role: self.role }
    }
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub identity: Identity,
    pub token: Option<String>,
}

/// JWT claims carried by the session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: String,
    pub role: String,
    pub exp: usize,
}
