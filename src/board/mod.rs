//! Board state: tasks partitioned into the three fixed columns.

pub mod metrics;
pub mod role;

use crate::models::{Column, TaskView};

pub use metrics::{is_overdue, item_is_overdue, Progress};
pub use role::resolve_role;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    columns: [Vec<TaskView>; 3],
    unplaced: Vec<TaskView>,
}

impl Board {
    /// Splits tasks by column, keeping their incoming order. Tasks whose
    /// stored column is not one of the three known identifiers are kept aside
    /// in [`Board::unplaced`] rather than dropped.
    pub fn partition(tasks: Vec<TaskView>) -> Self {
        let mut board = Board::default();
        for view in tasks {
            match view.task.column() {
                Some(column) => board.columns[column.index()].push(view),
                None => {
                    tracing::warn!(
                        task_id = %view.task.id,
                        column_id = %view.task.column_id,
                        "task has an unknown column"
                    );
                    board.unplaced.push(view);
                }
            }
        }
        board
    }

    pub fn column(&self, column: Column) -> &[TaskView] {
        &self.columns[column.index()]
    }

    pub fn unplaced(&self) -> &[TaskView] {
        &self.unplaced
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum::<usize>() + self.unplaced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::Task;

    fn view(title: &str, column_id: &str) -> TaskView {
        TaskView {
            task: Task {
                id: Uuid::new_v4(),
                project_id: Uuid::nil(),
                title: title.into(),
                column_id: column_id.into(),
                created_by: None,
                created_at: Utc::now(),
            },
            checklist: Vec::new(),
            assignments: Vec::new(),
        }
    }

    #[test]
    fn partitions_by_column_preserving_order() {
        let board = Board::partition(vec![
            view("a", "todo"),
            view("b", "done"),
            view("c", "todo"),
            view("d", "in-progress"),
        ]);

        let titles = |c| {
            board
                .column(c)
                .iter()
                .map(|v| v.task.title.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(titles(Column::Todo), ["a", "c"]);
        assert_eq!(titles(Column::InProgress), ["d"]);
        assert_eq!(titles(Column::Done), ["b"]);
        assert!(board.unplaced().is_empty());
        assert_eq!(board.len(), 4);
    }

    #[test]
    fn unknown_columns_are_kept_aside_not_dropped() {
        let stray = view("stray", "blocked");
        let stray_id = stray.task.id;
        let board = Board::partition(vec![view("a", "todo"), stray]);

        for column in Column::ALL {
            assert!(board.column(column).iter().all(|v| v.task.id != stray_id));
        }
        assert_eq!(board.unplaced().len(), 1);
        assert_eq!(board.unplaced()[0].task.id, stray_id);
        assert_eq!(board.len(), 2);
    }
}
