use uuid::Uuid;

use crate::models::{Project, ProjectMember, Role};

/// Owners are always editors; anyone else needs an explicit editor
/// membership row. Everyone else, including members with an unrecognized
/// role string, is a viewer.
pub fn resolve_role(project: &Project, membership: Option<&ProjectMember>, actor: Uuid) -> Role {
    if project.owner_id == actor {
        return Role::Editor;
    }

    match membership {
        Some(member) if member.user_id == actor && member.role() == Some(Role::Editor) => Role::Editor,
        _ => Role::Viewer,
    }
}
