use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::Database;
use crate::error::ServiceError;
use crate::models::{
    AssignmentView, ChecklistItem, Column, NewAssignment, NewChecklistItem, Task, UserProfile,
};

use super::{board, require_text, Actor, Mutation, ServiceResult};

/// Data behind the task detail modal.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDetail {
    pub task: Task,
    pub checklist: Vec<ChecklistItem>,
    pub assignments: Vec<AssignmentView>,
    pub users: Vec<UserProfile>,
}

impl TaskDetail {
    /// Profiles that are not yet assigned to the task.
    pub fn available_users(&self) -> Vec<&UserProfile> {
        self.users
            .iter()
            .filter(|u| !self.assignments.iter().any(|a| a.assignment.user_id == u.user_id))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    ReadOnly,
    Toggled { completed: bool },
    /// The first completed item moved the task from todo to in-progress.
    MovedToInProgress,
}

pub async fn load_task_detail(db: &dyn Database, task_id: Uuid) -> ServiceResult<TaskDetail> {
    let task = db.get_task(task_id).await?;
    let checklist = db.list_checklist(task_id).await?;
    let assignments = db.list_assignments(task_id).await?;
    let users = db.list_profiles().await?;

    Ok(TaskDetail {
        task,
        checklist,
        assignments,
        users,
    })
}

/// Appends an item after the current last position.
pub async fn add_item(
    db: &dyn Database,
    actor: &Actor,
    task_id: Uuid,
    title: &str,
    due_date: Option<DateTime<Utc>>,
) -> ServiceResult<Mutation> {
    if !actor.can_edit() {
        return Ok(Mutation::ReadOnly);
    }
    let title = require_text(title, ServiceError::EmptyTitle)?;
    let position = db.list_checklist(task_id).await?.len() as i32;

    let item = db
        .add_checklist_item(&NewChecklistItem {
            task_id,
            title,
            due_date,
            position,
        })
        .await?;
    tracing::info!(%task_id, item_id = %item.id, position, "checklist item added");

    Ok(Mutation::Applied)
}

/// Flips an item's completion. When this completes the first item of a task
/// that sits in todo, the task moves to in-progress.
///
/// The completion is written first and stays stored if the move then fails.
pub async fn toggle_item(
    db: &dyn Database,
    actor: &Actor,
    task: &Task,
    item: &ChecklistItem,
    now: DateTime<Utc>,
) -> ServiceResult<ToggleOutcome> {
    if !actor.can_edit() {
        return Ok(ToggleOutcome::ReadOnly);
    }

    let completed = !item.is_completed;
    db.set_checklist_completion(item.id, completed.then_some(now)).await?;
    tracing::debug!(item_id = %item.id, completed, "checklist item toggled");

    if completed && task.column() == Some(Column::Todo) {
        let done = db
            .list_checklist(task.id)
            .await?
            .iter()
            .filter(|i| i.is_completed)
            .count();
        if done == 1 {
            board::move_task(db, actor, task.id, Column::InProgress).await?;
            tracing::info!(task_id = %task.id, "first checklist item done, task started");
            return Ok(ToggleOutcome::MovedToInProgress);
        }
    }

    Ok(ToggleOutcome::Toggled { completed })
}

pub async fn delete_item(db: &dyn Database, actor: &Actor, item_id: Uuid) -> ServiceResult<Mutation> {
    if !actor.can_edit() {
        return Ok(Mutation::ReadOnly);
    }

    db.delete_checklist_item(item_id).await?;
    tracing::info!(%item_id, "checklist item deleted");

    Ok(Mutation::Applied)
}

/// Assigns `user_id` to the task, recording the acting user as the assigner.
pub async fn assign_user(
    db: &dyn Database,
    actor: &Actor,
    task_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<Mutation> {
    if !actor.can_edit() {
        return Ok(Mutation::ReadOnly);
    }

    db.assign(&NewAssignment {
        task_id,
        user_id,
        assigned_by: actor.user_id,
    })
    .await?;
    tracing::info!(%task_id, %user_id, assigned_by = %actor.user_id, "user assigned");

    Ok(Mutation::Applied)
}

pub async fn unassign_user(db: &dyn Database, actor: &Actor, assignment_id: Uuid) -> ServiceResult<Mutation> {
    if !actor.can_edit() {
        return Ok(Mutation::ReadOnly);
    }

    db.unassign(assignment_id).await?;
    tracing::info!(%assignment_id, "assignment removed");

    Ok(Mutation::Applied)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::MemoryDatabase;
    use crate::error::BackendError;
    use crate::models::Role;
    use crate::service::testing;

    struct Fixture {
        db: MemoryDatabase,
        actor: Actor,
        task: Task,
    }

    async fn fixture(column: Column, items: &[&str]) -> Fixture {
        let db = MemoryDatabase::new();
        let owner = testing::user(&db, "ana@example.com").await;
        let project = testing::project(&db, owner.user_id).await;
        let actor = Actor::new(owner.user_id, Role::Editor);
        board::add_task(&db, &actor, project.id, column, "Ship it").await.unwrap();
        let task = db.list_tasks(project.id).await.unwrap().remove(0).task;
        for title in items {
            add_item(&db, &actor, task.id, title, None).await.unwrap();
        }
        Fixture { db, actor, task }
    }

    async fn toggle_at(f: &Fixture, index: usize) -> ToggleOutcome {
        let task = f.db.get_task(f.task.id).await.unwrap();
        let item = f.db.list_checklist(task.id).await.unwrap().remove(index);
        toggle_item(&f.db, &f.actor, &task, &item, Utc::now()).await.unwrap()
    }

    #[tokio::test]
    async fn items_are_appended_in_order() {
        let f = fixture(Column::Todo, &["one", "two", "three"]).await;
        let items = f.db.list_checklist(f.task.id).await.unwrap();
        let positions: Vec<(i32, &str)> = items.iter().map(|i| (i.position, i.title.as_str())).collect();
        assert_eq!(positions, [(0, "one"), (1, "two"), (2, "three")]);
    }

    #[tokio::test]
    async fn toggling_stamps_and_clears_completion_time() {
        let f = fixture(Column::InProgress, &["one"]).await;
        assert_eq!(toggle_at(&f, 0).await, ToggleOutcome::Toggled { completed: true });
        let item = &f.db.list_checklist(f.task.id).await.unwrap()[0];
        assert!(item.is_completed);
        assert!(item.completed_at.is_some());

        assert_eq!(toggle_at(&f, 0).await, ToggleOutcome::Toggled { completed: false });
        let item = &f.db.list_checklist(f.task.id).await.unwrap()[0];
        assert!(!item.is_completed);
        assert!(item.completed_at.is_none());
    }

    #[tokio::test]
    async fn first_completion_in_todo_starts_the_task_once() {
        let f = fixture(Column::Todo, &["one", "two", "three"]).await;

        assert_eq!(toggle_at(&f, 0).await, ToggleOutcome::MovedToInProgress);
        assert_eq!(f.db.get_task(f.task.id).await.unwrap().column(), Some(Column::InProgress));

        assert_eq!(toggle_at(&f, 1).await, ToggleOutcome::Toggled { completed: true });
        assert_eq!(toggle_at(&f, 2).await, ToggleOutcome::Toggled { completed: true });
        assert_eq!(f.db.get_task(f.task.id).await.unwrap().column(), Some(Column::InProgress));
    }

    #[tokio::test]
    async fn no_transition_outside_todo_or_on_uncheck() {
        let f = fixture(Column::Done, &["one"]).await;
        assert_eq!(toggle_at(&f, 0).await, ToggleOutcome::Toggled { completed: true });
        assert_eq!(f.db.get_task(f.task.id).await.unwrap().column(), Some(Column::Done));

        let f = fixture(Column::Todo, &["one", "two"]).await;
        let task = f.task.clone();
        let mut item = f.db.list_checklist(task.id).await.unwrap().remove(0);
        f.db.set_checklist_completion(item.id, Some(Utc::now())).await.unwrap();
        item.is_completed = true;
        let outcome = toggle_item(&f.db, &f.actor, &task, &item, Utc::now()).await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Toggled { completed: false });
        assert_eq!(f.db.get_task(task.id).await.unwrap().column(), Some(Column::Todo));
    }

    #[tokio::test]
    async fn second_completion_in_todo_does_not_transition() {
        let f = fixture(Column::Todo, &["one", "two"]).await;
        let items = f.db.list_checklist(f.task.id).await.unwrap();
        f.db.set_checklist_completion(items[0].id, Some(Utc::now())).await.unwrap();

        assert_eq!(toggle_at(&f, 1).await, ToggleOutcome::Toggled { completed: true });
        assert_eq!(f.db.get_task(f.task.id).await.unwrap().column(), Some(Column::Todo));
    }

    #[tokio::test]
    async fn viewer_cannot_touch_the_checklist() {
        let f = fixture(Column::Todo, &["one"]).await;
        let viewer = Actor::new(Uuid::new_v4(), Role::Viewer);
        let item = f.db.list_checklist(f.task.id).await.unwrap().remove(0);
        let writes = f.db.writes();

        assert_eq!(
            toggle_item(&f.db, &viewer, &f.task, &item, Utc::now()).await.unwrap(),
            ToggleOutcome::ReadOnly
        );
        assert_eq!(add_item(&f.db, &viewer, f.task.id, "x", None).await.unwrap(), Mutation::ReadOnly);
        assert_eq!(delete_item(&f.db, &viewer, item.id).await.unwrap(), Mutation::ReadOnly);
        assert_eq!(
            assign_user(&f.db, &viewer, f.task.id, viewer.user_id).await.unwrap(),
            Mutation::ReadOnly
        );
        assert_eq!(f.db.writes(), writes);
    }

    #[tokio::test]
    async fn assignment_records_the_acting_user() {
        let f = fixture(Column::Todo, &[]).await;
        let bogdan = testing::user(&f.db, "bogdan@example.com").await;

        assign_user(&f.db, &f.actor, f.task.id, bogdan.user_id).await.unwrap();
        let detail = load_task_detail(&f.db, f.task.id).await.unwrap();
        assert_eq!(detail.assignments.len(), 1);
        let assignment = &detail.assignments[0];
        assert_eq!(assignment.assignment.user_id, bogdan.user_id);
        assert_eq!(assignment.assignment.assigned_by, Some(f.actor.user_id));
        assert_eq!(assignment.initials(), "BO");

        let available: Vec<&str> = detail.available_users().iter().map(|u| u.full_name.as_str()).collect();
        assert_eq!(available, ["ana"]);

        unassign_user(&f.db, &f.actor, assignment.assignment.id).await.unwrap();
        let detail = load_task_detail(&f.db, f.task.id).await.unwrap();
        assert!(detail.assignments.is_empty());
        assert_eq!(detail.available_users().len(), 2);
    }

    #[tokio::test]
    async fn assigning_the_same_user_twice_is_rejected() {
        let f = fixture(Column::Todo, &[]).await;
        let bogdan = testing::user(&f.db, "bogdan@example.com").await;

        assign_user(&f.db, &f.actor, f.task.id, bogdan.user_id).await.unwrap();
        let err = assign_user(&f.db, &f.actor, f.task.id, bogdan.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Backend(BackendError::Conflict)));

        let assignments = f.db.list_assignments(f.task.id).await.unwrap();
        assert_eq!(assignments.len(), 1);
    }

    #[tokio::test]
    async fn due_dates_are_stored_and_blank_titles_rejected() {
        let f = fixture(Column::Todo, &[]).await;
        let due = Utc::now() - Duration::hours(3);
        add_item(&f.db, &f.actor, f.task.id, "late", Some(due)).await.unwrap();
        let items = f.db.list_checklist(f.task.id).await.unwrap();
        assert_eq!(items[0].due_date, Some(due));
        assert!(crate::board::is_overdue(&items, Utc::now()));

        let err = add_item(&f.db, &f.actor, f.task.id, " ", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::EmptyTitle));
    }
}
