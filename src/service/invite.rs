use uuid::Uuid;

use crate::db::Database;
use crate::models::{NewMember, Role, UserProfile};

use super::{Actor, Mutation, ServiceResult};

/// Profiles that are not members of the project yet.
pub async fn load_invitable(db: &dyn Database, project_id: Uuid) -> ServiceResult<Vec<UserProfile>> {
    let members = db.list_members(project_id).await?;
    let profiles = db.list_profiles().await?;

    Ok(profiles
        .into_iter()
        .filter(|p| !members.iter().any(|m| m.member.user_id == p.user_id))
        .collect())
}

pub async fn invite_member(
    db: &dyn Database,
    actor: &Actor,
    project_id: Uuid,
    user_id: Uuid,
    role: Role,
) -> ServiceResult<Mutation> {
    if !actor.can_edit() {
        return Ok(Mutation::ReadOnly);
    }

    db.add_member(&NewMember {
        project_id,
        user_id,
        role,
        added_by: actor.user_id,
    })
    .await?;
    tracing::info!(%project_id, %user_id, %role, added_by = %actor.user_id, "member invited");

    Ok(Mutation::Applied)
}
