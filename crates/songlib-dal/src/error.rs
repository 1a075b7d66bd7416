pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("No fields to update")]
    EmptyUpdate,
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::RecordNotFound(_) | Error::DatabaseError(sqlx::Error::RowNotFound)
        )
    }
}
