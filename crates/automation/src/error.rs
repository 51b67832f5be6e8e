use cadence_core::types::DbId;

/// Datastore failure. Retryable at the next scheduled cycle.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a whole sweep or event invocation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Effect record {0} has an unrecognised epoch key")]
    MalformedEffect(DbId),
}
