use thiserror::Error;
use uuid::Uuid;

use crate::models::Column;

/// Errors surfaced by board operations.
///
/// `Store` failures are recoverable: the operation is aborted and prior
/// in-memory state is preserved. The validation variants reject the request
/// without mutating anything.
#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("no project found for code {0}")]
    ProjectNotFound(String),

    #[error("task {0} not found")]
    TaskNotFound(Uuid),

    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),

    #[error("task is already in column {0}")]
    ColumnUnchanged(Column),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("unknown color: {0}")]
    UnknownColor(String),

    #[error("incorrect admin password")]
    IncorrectPassword,

    #[error("clearing the project requires explicit confirmation")]
    ConfirmationRequired,

    #[error("invalid snapshot document: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("invalid logo image: {0}")]
    Logo(#[from] image::ImageError),

    #[error("failed to generate document: {0}")]
    Render(String),

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, KanbanError>;
