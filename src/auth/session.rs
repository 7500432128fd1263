//! Server-side session rows for issued tokens.
//!
//! Only a salted hash of the token is persisted. Because the hash is
//! salted it cannot serve as a lookup key, so validity is checked per user
//! id: any unexpired session row for the subject keeps their tokens live.

use tracing::warn;
use uuid::Uuid;

use super::password;
use super::types::{AuthError, ClientInfo};
use crate::store::{Store, StoreError};

/// Record a new session for an issued token, then opportunistically sweep
/// expired rows. The sweep is best-effort housekeeping; its failure never
/// fails the login that triggered it.
pub(super) async fn create(
    store: &Store,
    user_id: Uuid,
    token: &str,
    client: &ClientInfo,
    ttl_seconds: i64,
) -> Result<(), AuthError> {
    let token_hash = password::hash(token.to_string()).await?;

    let query = r"
        INSERT INTO user_sessions
            (id, user_id, token_hash, expires_at, ip_address, user_agent)
        VALUES ($1, $2, $3, NOW() + ($4 * INTERVAL '1 second'), $5, $6)
    ";
    store
        .run(
            "INSERT",
            query,
            sqlx::query(query)
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(token_hash)
                .bind(ttl_seconds)
                .bind(client.ip_address.as_deref())
                .bind(client.user_agent.as_deref())
                .execute(store.pool()),
        )
        .await?;

    if let Err(err) = prune_expired(store).await {
        warn!("failed to prune expired sessions: {err}");
    }

    Ok(())
}

/// Delete every session for the user. Logout invalidates all devices at
/// once; per-device logout is a deliberate non-feature of this core.
pub(super) async fn destroy_for_user(store: &Store, user_id: Uuid) -> Result<(), StoreError> {
    let query = "DELETE FROM user_sessions WHERE user_id = $1";
    store
        .run(
            "DELETE",
            query,
            sqlx::query(query).bind(user_id).execute(store.pool()),
        )
        .await?;
    Ok(())
}

/// True iff at least one unexpired session row exists for the user.
pub(super) async fn is_valid(store: &Store, user_id: Uuid) -> Result<bool, StoreError> {
    let query = r"
        SELECT 1
        FROM user_sessions
        WHERE user_id = $1
          AND expires_at > NOW()
        LIMIT 1
    ";
    let row = store
        .run(
            "SELECT",
            query,
            sqlx::query(query)
                .bind(user_id)
                .fetch_optional(store.pool()),
        )
        .await?;
    Ok(row.is_some())
}

/// Delete all globally expired session rows, returning how many went away.
pub(super) async fn prune_expired(store: &Store) -> Result<u64, StoreError> {
    let query = "DELETE FROM user_sessions WHERE expires_at <= NOW()";
    let result = store
        .run("DELETE", query, sqlx::query(query).execute(store.pool()))
        .await?;
    Ok(result.rows_affected())
}
