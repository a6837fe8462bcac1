use uuid::Uuid;

use crate::db::Database;
use crate::models::{AssignedTask, Column};

use super::ServiceResult;

/// Tasks assigned to `user_id` that are not done yet.
pub async fn load_my_tasks(db: &dyn Database, user_id: Uuid) -> ServiceResult<Vec<AssignedTask>> {
    let tasks = db.list_assigned_tasks(user_id).await?;

    Ok(tasks
        .into_iter()
        .filter(|t| t.task.column() != Some(Column::Done))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::db::MemoryDatabase;
    use crate::service::{board, task_detail, testing, Actor};

    #[tokio::test]
    async fn lists_open_assigned_tasks_with_project_name() {
        let db = MemoryDatabase::new();
        let ana = testing::user(&db, "ana@example.com").await;
        let project = testing::project(&db, ana.user_id).await;
        let actor = Actor::new(ana.user_id, Role::Editor);
        for (title, column) in [("open", Column::Todo), ("closed", Column::Done), ("mine-not", Column::Todo)] {
            board::add_task(&db, &actor, project.id, column, title).await.unwrap();
        }
        for view in db.list_tasks(project.id).await.unwrap() {
            if view.task.title != "mine-not" {
                task_detail::assign_user(&db, &actor, view.task.id, ana.user_id).await.unwrap();
            }
        }

        let tasks = load_my_tasks(&db, ana.user_id).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task.title, "open");
        assert_eq!(tasks[0].project_name.as_deref(), Some("Launch"));
    }
}
