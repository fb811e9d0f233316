use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Column, NoteColor};

/// A single post-it belonging to one column of one project.
///
/// The owning project is implied by the task set it is saved with; snapshot
/// documents and the in-memory board carry tasks without a project reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub content: String,
    /// `#RRGGBB` value from the fixed palette; kept as text because that is
    /// what the store and snapshots carry. See [`NoteColor`].
    pub color: String,
    pub owner: String,
    #[sqlx(rename = "column_name")]
    pub column: Column,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a fresh task with both timestamps set to the same instant.
    pub fn new(content: String, color: NoteColor, owner: String, column: Column) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            content,
            color: color.hex().to_string(),
            owner,
            column,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
