//! # Vigil Auth (authentication & session core)
//!
//! `vigil-auth` is the authentication and session-management core of the
//! Vigil compliance platform: password hashing, token issuance and
//! verification, session persistence, and the pooled connection wrapper
//! around the relational store that backs it all.
//!
//! ## Token model
//!
//! Logins produce an HS256-signed bearer token carrying the user id and a
//! token class (`access`), valid for seven days. A matching session row,
//! which stores a salted hash of the token and never the raw value, must
//! exist and be unexpired for the token to be honored. Signature validity alone is
//! never enough: revoking sessions kills stolen tokens.
//!
//! ## Availability model
//!
//! All queries flow through [`Store`], which tracks store reachability.
//! After a connection-level failure, queries fast-fail for a fixed 30 s
//! back-off window instead of piling up doomed connection attempts.
//!
//! ## What this crate is not
//!
//! No HTTP types, no schema migrations, no OAuth/SSO, no rate limiting, no
//! email verification flow. Upstream handlers own all of that; this crate
//! takes plain data and returns plain data or a typed failure.

pub mod auth;
pub mod config;
pub mod store;

pub use auth::{
    Auth, AuthError, ClientInfo, LoginResponse, NewUser, TokenClaims, TokenError, TokenService,
    User,
};
pub use config::{AuthConfig, StoreConfig};
pub use store::{Store, StoreError};
