use uuid::Uuid;

use crate::db::Database;
use crate::error::ServiceError;
use crate::models::{NewProject, Project};

use super::{require_text, ServiceResult};

pub async fn load_projects(db: &dyn Database) -> ServiceResult<Vec<Project>> {
    Ok(db.list_active_projects().await?)
}

/// Creates a project owned by `owner` and records the owner as an editor
/// member. Ownership alone already grants editor rights, so a backend that
/// loses the membership row still leaves the owner able to edit.
pub async fn create_project(
    db: &dyn Database,
    owner: Uuid,
    name: &str,
    description: &str,
) -> ServiceResult<Project> {
    let name = require_text(name, ServiceError::EmptyName)?;
    let description = Some(description.trim().to_string()).filter(|d| !d.is_empty());

    let project = db
        .create_project(&NewProject {
            name,
            description,
            owner_id: owner,
        })
        .await?;
    tracing::info!(project_id = %project.id, owner = %owner, "project created");

    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;
    use crate::models::Role;

    #[tokio::test]
    async fn creator_becomes_editor_member() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let project = create_project(&db, owner, "  Website  ", "  ").await.unwrap();

        assert_eq!(project.name, "Website");
        assert_eq!(project.description, None);
        assert_eq!(project.owner_id, owner);

        let member = db.get_membership(project.id, owner).await.unwrap().unwrap();
        assert_eq!(member.role(), Some(Role::Editor));
        assert_eq!(member.added_by, Some(owner));
    }

    #[tokio::test]
    async fn blank_name_is_rejected_without_writes() {
        let db = MemoryDatabase::new();
        let err = create_project(&db, Uuid::new_v4(), " ", "desc").await.unwrap_err();
        assert!(matches!(err, ServiceError::EmptyName));
        assert_eq!(db.writes(), 0);
        assert!(load_projects(&db).await.unwrap().is_empty());
    }
}
