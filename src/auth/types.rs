//! User records, registration input, and the auth error taxonomy.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Full user profile as stored. The password hash never leaves the crate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub role: String,
    pub plan_type: String,
    /// The flag exists in the schema; the verification flow does not.
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input. Email is normalized (trimmed, lower-cased) before
/// any lookup or insert.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
}

/// Client metadata recorded alongside a session, when the caller has it.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Successful login: the profile plus the raw token for the caller to hand
/// to the client. The raw token is never persisted.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("an account with this email already exists")]
    AlreadyExists,
    /// Covers both unknown email and wrong password so responses cannot be
    /// used to enumerate accounts.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid email address")]
    InvalidEmail,
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Hashing or signing failed; indicates misconfiguration or corrupt
    /// data, never a simple mismatch.
    #[error("crypto failure: {0}")]
    Crypto(String),
}

#[cfg(test)]
mod tests {
    use super::{AuthError, ClientInfo, NewUser};
    use crate::store::StoreError;

    #[test]
    fn invalid_credentials_message_is_generic() {
        let message = AuthError::InvalidCredentials.to_string();
        assert!(!message.contains("email not found"));
        assert!(!message.contains("password mismatch"));
        assert_eq!(message, "invalid email or password");
    }

    #[test]
    fn store_errors_pass_through_transparently() {
        let err = AuthError::from(StoreError::Unavailable);
        assert_eq!(err.to_string(), StoreError::Unavailable.to_string());
    }

    #[test]
    fn defaults_are_empty() {
        let new_user = NewUser::default();
        assert!(new_user.email.is_empty());
        assert!(new_user.first_name.is_none());

        let client = ClientInfo::default();
        assert!(client.ip_address.is_none());
        assert!(client.user_agent.is_none());
    }
}
