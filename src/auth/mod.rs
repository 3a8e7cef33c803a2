pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use password::{hash_password, verify_password, verify_password_blocking, PasswordError, DEFAULT_COST};
pub use token::{Claims, TokenCodec, TokenError};

/// Authenticated user, as carried in credential claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
}

impl Identity {
    pub const ADMIN_ROLE: &'static str = "admin";

    /// Reads the identity claims; `None` when any of them is missing or mistyped.
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        serde_json::from_value(Value::Object(claims.clone())).ok()
    }

    pub fn to_claims(&self) -> Claims {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Claims::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Self::ADMIN_ROLE
    }
}
