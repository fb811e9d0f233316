use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KanbanError;

/// One of the five fixed workflow stages of a board.
///
/// Stored in the `column_name` column of the `tasks` table and serialized
/// by variant name in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Column {
    Backlog,
    Analysis,
    Development,
    Testing,
    Done,
}

impl Column {
    /// All columns in board order, left to right.
    pub const ALL: [Column; 5] = [
        Column::Backlog,
        Column::Analysis,
        Column::Development,
        Column::Testing,
        Column::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Backlog => "Backlog",
            Column::Analysis => "Analysis",
            Column::Development => "Development",
            Column::Testing => "Testing",
            Column::Done => "Done",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = KanbanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| KanbanError::UnknownColumn(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_five_columns() {
        for column in Column::ALL {
            assert_eq!(column.as_str().parse::<Column>().unwrap(), column);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("backlog".parse::<Column>().unwrap(), Column::Backlog);
        assert_eq!("DONE".parse::<Column>().unwrap(), Column::Done);
    }

    #[test]
    fn rejects_unknown_column() {
        assert!("Archive".parse::<Column>().is_err());
    }
}
