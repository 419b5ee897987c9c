use std::time::Duration;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Schema migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("User password error: {0}")]
    UserPasswordError(#[from] argon2::password_hash::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Edit conflict on record {id} at version {version}")]
    EditConflict { id: i64, version: i64 },

    #[error("Duplicate email")]
    DuplicateEmail,

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),

    #[error("Query did not finish within {0:?}")]
    Timeout(Duration),
}
