use std::fmt;
use std::str::FromStr;

use crate::error::ServiceError;

/// One of the three fixed board columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Todo,
    InProgress,
    Done,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Todo, Column::InProgress, Column::Done];

    /// Identifier stored in the `tasks.column_id` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Todo => "todo",
            Column::InProgress => "in-progress",
            Column::Done => "done",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Column::Todo => "To do",
            Column::InProgress => "In progress",
            Column::Done => "Done",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Column::Todo => 0,
            Column::InProgress => 1,
            Column::Done => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Column> {
        Self::ALL.get(index).copied()
    }

    /// Column to the right, if any.
    pub fn next(self) -> Option<Column> {
        Self::from_index(self.index() + 1)
    }

    /// Column to the left, if any.
    pub fn previous(self) -> Option<Column> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Column::Todo),
            "in-progress" => Ok(Column::InProgress),
            "done" => Ok(Column::Done),
            other => Err(ServiceError::UnknownColumn(other.to_string())),
        }
    }
}
