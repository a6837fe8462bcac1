use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub task_id: Uuid,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub position: i32,
}

#[derive(Debug, Clone)]
pub struct NewChecklistItem {
    pub task_id: Uuid,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub position: i32,
}
