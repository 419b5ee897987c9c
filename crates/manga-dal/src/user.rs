use std::time::Duration;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{Result as HashResult, SaltString, rand_core::OsRng},
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::debug;

use crate::{ChosenDB, DEFAULT_QUERY_TIMEOUT, Error, error::Result, with_timeout};

fn hash_password(password: &str) -> HashResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

/// Registration payload. No `Debug`, so the plaintext password never ends up in logs.
#[derive(Clone, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(deny_unknown_fields)]
pub struct CreateUser {
    #[garde(length(chars, min = 1, max = 500))]
    #[serde(default)]
    pub name: String,
    #[garde(email)]
    #[serde(default)]
    pub email: String,
    #[garde(length(min = 8, max = 72))]
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub created_at: time::OffsetDateTime,
    pub name: String,
    pub email: String,
    pub activated: bool,
    #[serde(skip)]
    pub version: i64,
}

pub type UserRepository = UserRepositoryImpl<Pool<ChosenDB>>;

pub struct UserRepositoryImpl<E> {
    executor: E,
    timeout: Duration,
}

impl<'c, E> UserRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn create(&self, payload: CreateUser) -> Result<User> {
        let password_hash = hash_password(&payload.password)?;
        let query = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?) \
             RETURNING id, created_at, name, email, activated, version",
        )
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(password_hash)
        .fetch_one(&self.executor);

        with_timeout(self.timeout, async {
            query.await.map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    debug!("User with email {} already exists", payload.email);
                    Error::DuplicateEmail
                }
                e => e.into(),
            })
        })
        .await
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        let query = sqlx::query_as::<_, User>(
            "SELECT id, created_at, name, email, activated, version FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.executor);

        with_timeout(self.timeout, async { query.await.map_err(Error::from) })
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("User {id}")))
    }
}
