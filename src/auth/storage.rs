//! User-table statements behind the auth façade.

use sqlx::Row;
use uuid::Uuid;

use super::types::User;
use crate::store::{Store, StoreError};

const USER_COLUMNS: &str = "id, email, first_name, last_name, company, role, plan_type, \
     email_verified, created_at, updated_at";

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub(super) enum InsertOutcome {
    Created(User),
    Conflict,
}

pub(super) async fn insert_user(
    store: &Store,
    email: &str,
    password_hash: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
    company: Option<&str>,
) -> Result<InsertOutcome, StoreError> {
    let query = r"
        INSERT INTO users
            (id, email, password_hash, first_name, last_name, company)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, email, first_name, last_name, company, role, plan_type,
            email_verified, created_at, updated_at
    ";
    let row = store
        .run(
            "INSERT",
            query,
            sqlx::query(query)
                .bind(Uuid::new_v4())
                .bind(email)
                .bind(password_hash)
                .bind(first_name)
                .bind(last_name)
                .bind(company)
                .fetch_one(store.pool()),
        )
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(user_from_row(&row)?)),
        // Uniqueness is enforced by the database, not a racy pre-select.
        Err(StoreError::Query(err)) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err),
    }
}

/// Look up a user by normalized email, returning the stored password hash
/// alongside the profile for credential verification.
pub(super) async fn lookup_user_by_email(
    store: &Store,
    email: &str,
) -> Result<Option<(User, String)>, StoreError> {
    let query = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1");
    let row = store
        .run(
            "SELECT",
            &query,
            sqlx::query(&query).bind(email).fetch_optional(store.pool()),
        )
        .await?;

    row.map(|row| {
        let password_hash: String = row.try_get("password_hash")?;
        Ok((user_from_row(&row)?, password_hash))
    })
    .transpose()
}

pub(super) async fn lookup_user_by_id(
    store: &Store,
    user_id: Uuid,
) -> Result<Option<User>, StoreError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let row = store
        .run(
            "SELECT",
            &query,
            sqlx::query(&query)
                .bind(user_id)
                .fetch_optional(store.pool()),
        )
        .await?;

    row.map(|row| user_from_row(&row)).transpose()
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        company: row.try_get("company")?,
        role: row.try_get("role")?,
        plan_type: row.try_get("plan_type")?,
        email_verified: row.try_get("email_verified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::is_unique_violation;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
