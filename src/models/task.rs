use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AssignmentView, ChecklistItem, Column};

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub column_id: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Parsed column; `None` for identifiers outside the fixed set.
    pub fn column(&self) -> Option<Column> {
        self.column_id.parse().ok()
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub column: Column,
    pub created_by: Uuid,
}

/// A task with its checklist (ordered by position) and assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    pub task: Task,
    pub checklist: Vec<ChecklistItem>,
    pub assignments: Vec<AssignmentView>,
}

/// A task assigned to the current user, as listed on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedTask {
    pub task: Task,
    pub project_name: Option<String>,
    pub checklist: Vec<ChecklistItem>,
}
