//! Auth façade: registration, login, logout, and session validation.
//!
//! The façade is the only surface other layers call. A bearer token is
//! trusted only when its signature verifies *and* a live session row exists
//! for its subject; a stolen token dies with the sessions it belonged to.

use regex::Regex;
use tracing::info;
use uuid::Uuid;

mod password;
mod session;
mod storage;
pub mod token;
mod types;

pub use token::{TokenClaims, TokenError, TokenService, CLASS_ACCESS, TOKEN_TTL_SECONDS};
pub use types::{AuthError, ClientInfo, LoginResponse, NewUser, User};

use crate::config::AuthConfig;
use crate::store::Store;
use storage::InsertOutcome;

pub struct Auth {
    store: Store,
    tokens: TokenService,
    config: AuthConfig,
}

impl Auth {
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] when the signing secret is empty; this
    /// is a misconfiguration that must halt startup, not be limped past.
    pub fn new(store: Store, config: AuthConfig) -> Result<Self, AuthError> {
        let tokens = TokenService::new(config.signing_secret().clone())
            .map_err(|err| AuthError::Crypto(err.to_string()))?;
        Ok(Self {
            store,
            tokens,
            config,
        })
    }

    /// Create a user. Returns the stored profile; callers wanting a session
    /// compose this with [`Auth::login`].
    ///
    /// # Errors
    ///
    /// [`AuthError::AlreadyExists`] when the normalized email is taken,
    /// [`AuthError::InvalidEmail`] when it does not look like an address.
    pub async fn register(&self, new_user: NewUser) -> Result<User, AuthError> {
        let email = normalize_email(&new_user.email);
        if !valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }

        let password_hash = password::hash(new_user.password).await?;
        let outcome = storage::insert_user(
            &self.store,
            &email,
            &password_hash,
            new_user.first_name.as_deref(),
            new_user.last_name.as_deref(),
            new_user.company.as_deref(),
        )
        .await?;

        match outcome {
            InsertOutcome::Created(user) => {
                info!(user_id = %user.id, "user registered");
                Ok(user)
            }
            InsertOutcome::Conflict => Err(AuthError::AlreadyExists),
        }
    }

    /// Verify credentials, issue a token, and record a session.
    ///
    /// # Errors
    ///
    /// Unknown email and wrong password both surface as
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(email);
        let Some((user, password_hash)) =
            storage::lookup_user_by_email(&self.store, &email).await?
        else {
            // Burn comparable hashing work so an unknown email is not
            // distinguishable from a wrong password by response time.
            let _ = password::hash(password.to_string()).await;
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify(password.to_string(), password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(user.id)
            .map_err(|err| AuthError::Crypto(err.to_string()))?;
        session::create(
            &self.store,
            user.id,
            &token,
            client,
            self.config.session_ttl_seconds(),
        )
        .await?;

        info!(user_id = %user.id, "login");
        Ok(LoginResponse { user, token })
    }

    /// Destroy all sessions for the token's subject. A token that fails
    /// verification is a no-op, so repeated logouts are idempotent.
    ///
    /// # Errors
    ///
    /// Only store failures surface; an invalid token is not an error.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let Some(claims) = self.tokens.verify(token) else {
            return Ok(());
        };
        session::destroy_for_user(&self.store, claims.sub).await?;
        info!(user_id = %claims.sub, "logout");
        Ok(())
    }

    /// Resolve a token to its user profile, or `None` for anything short of
    /// a well-signed, unexpired token backed by a live session.
    ///
    /// # Errors
    ///
    /// Only store failures surface; "unauthenticated" is `Ok(None)`.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, AuthError> {
        let Some(claims) = self.tokens.verify(token) else {
            return Ok(None);
        };
        if !session::is_valid(&self.store, claims.sub).await? {
            return Ok(None);
        }
        Ok(storage::lookup_user_by_id(&self.store, claims.sub).await?)
    }

    /// Sweep globally expired session rows; also runs opportunistically on
    /// every login. Exposed for callers running a periodic cleanup task.
    ///
    /// # Errors
    ///
    /// Returns a store failure when the sweep statement cannot run.
    pub async fn prune_expired_sessions(&self) -> Result<u64, AuthError> {
        Ok(session::prune_expired(&self.store).await?)
    }

    /// Destroy all sessions for a user directly, e.g. administratively.
    ///
    /// # Errors
    ///
    /// Returns a store failure when the delete cannot run.
    pub async fn revoke_user_sessions(&self, user_id: Uuid) -> Result<(), AuthError> {
        Ok(session::destroy_for_user(&self.store, user_id).await?)
    }
}

/// Normalize an email for lookup/uniqueness checks.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}
