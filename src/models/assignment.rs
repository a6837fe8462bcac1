use uuid::Uuid;

use super::UserProfile;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct TaskAssignment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub assigned_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub assigned_by: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentView {
    pub assignment: TaskAssignment,
    pub profile: Option<UserProfile>,
}

impl AssignmentView {
    pub fn initials(&self) -> &str {
        self.profile.as_ref().map_or("?", |p| p.initials.as_str())
    }

    pub fn display_name(&self) -> &str {
        self.profile.as_ref().map_or("User", |p| p.full_name.as_str())
    }
}
