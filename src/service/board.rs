use uuid::Uuid;

use crate::board::{resolve_role, Board};
use crate::db::Database;
use crate::error::ServiceError;
use crate::models::{Column, MemberView, NewTask, Project, Role};

use super::{require_text, Actor, Mutation, ServiceResult};

/// Everything the board screen renders for one project.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub project: Project,
    pub role: Role,
    pub members: Vec<MemberView>,
    pub board: Board,
}

impl BoardSnapshot {
    pub fn actor(&self, user_id: Uuid) -> Actor {
        Actor::new(user_id, self.role)
    }
}

pub async fn load_board(db: &dyn Database, project_id: Uuid, user_id: Uuid) -> ServiceResult<BoardSnapshot> {
    let project = db.get_project(project_id).await?;
    let membership = if project.owner_id == user_id {
        None
    } else {
        db.get_membership(project_id, user_id).await?
    };
    let role = resolve_role(&project, membership.as_ref(), user_id);
    let members = db.list_members(project_id).await?;
    let tasks = db.list_tasks(project_id).await?;

    tracing::debug!(%project_id, %role, tasks = tasks.len(), "board loaded");

    Ok(BoardSnapshot {
        project,
        role,
        members,
        board: Board::partition(tasks),
    })
}

pub async fn add_task(
    db: &dyn Database,
    actor: &Actor,
    project_id: Uuid,
    column: Column,
    title: &str,
) -> ServiceResult<Mutation> {
    if !actor.can_edit() {
        tracing::debug!(user_id = %actor.user_id, "add task ignored for viewer");
        return Ok(Mutation::ReadOnly);
    }
    let title = require_text(title, ServiceError::EmptyTitle)?;

    let task = db
        .create_task(&NewTask {
            project_id,
            title,
            column,
            created_by: actor.user_id,
        })
        .await?;
    tracing::info!(task_id = %task.id, %column, "task added");

    Ok(Mutation::Applied)
}

pub async fn delete_task(db: &dyn Database, actor: &Actor, task_id: Uuid) -> ServiceResult<Mutation> {
    if !actor.can_edit() {
        tracing::debug!(user_id = %actor.user_id, "delete task ignored for viewer");
        return Ok(Mutation::ReadOnly);
    }

    db.delete_task(task_id).await?;
    tracing::info!(%task_id, "task deleted");

    Ok(Mutation::Applied)
}

pub async fn move_task(
    db: &dyn Database,
    actor: &Actor,
    task_id: Uuid,
    destination: Column,
) -> ServiceResult<Mutation> {
    if !actor.can_edit() {
        tracing::debug!(user_id = %actor.user_id, "move task ignored for viewer");
        return Ok(Mutation::ReadOnly);
    }

    db.set_task_column(task_id, destination).await?;
    tracing::info!(%task_id, %destination, "task moved");

    Ok(Mutation::Applied)
}

/// Like [`move_task`] for a destination given as a raw identifier. Anything
/// outside the three known columns is rejected before reaching the backend.
pub async fn move_task_to(
    db: &dyn Database,
    actor: &Actor,
    task_id: Uuid,
    destination: &str,
) -> ServiceResult<Mutation> {
    let destination: Column = destination.parse()?;
    move_task(db, actor, task_id, destination).await
}
