use uuid::Uuid;

use super::{Role, UserProfile};

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub added_by: Option<Uuid>,
}

impl ProjectMember {
    /// Parsed role; `None` when the stored value is not a known role.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub added_by: Uuid,
}

/// A membership row joined with the member's profile, if one exists.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberView {
    pub member: ProjectMember,
    pub profile: Option<UserProfile>,
}

impl MemberView {
    pub fn initials(&self) -> &str {
        self.profile.as_ref().map_or("?", |p| p.initials.as_str())
    }

    pub fn display_name(&self) -> &str {
        self.profile.as_ref().map_or("User", |p| p.full_name.as_str())
    }
}
