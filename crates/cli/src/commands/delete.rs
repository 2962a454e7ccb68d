//! Row deletion command.
//!
//! Deletes one row with the same cascade and set-null rules the storefront
//! applies, and logs what was removed or detached.

use bozor_core::relations::Entity;
use bozor_storefront::db::{self, RepositoryError};
use thiserror::Error;

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("No {entity} with id {id}")]
    NotFound { entity: Entity, id: i32 },

    #[error("Delete failed: {0}")]
    Repository(RepositoryError),
}

/// Delete `entity` row `id` and its dependents.
///
/// # Errors
///
/// Returns `DeleteError::NotFound` if the row does not exist.
pub async fn run(entity: Entity, id: i32) -> Result<(), DeleteError> {
    let pool = connect().await?;

    let report = db::delete_entity(&pool, entity, id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => DeleteError::NotFound { entity, id },
            other => DeleteError::Repository(other),
        })?;

    tracing::info!("Deleted {entity} {id}: {report}");
    Ok(())
}
