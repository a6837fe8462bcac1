//! Per-task display metrics derived from a checklist.

use chrono::{DateTime, Utc};

use crate::models::ChecklistItem;

/// Completed versus total checklist items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn of(items: &[ChecklistItem]) -> Self {
        Self {
            done: items.iter().filter(|i| i.is_completed).count(),
            total: items.len(),
        }
    }

    /// Completion percentage, 0 for an empty checklist.
    pub fn percent(&self) -> u16 {
        if self.total == 0 {
            return 0;
        }
        (self.done * 100 / self.total) as u16
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.done, self.total)
    }

    /// Text progress bar of `width` cells.
    pub fn bar(&self, width: usize) -> String {
        let filled = if self.total == 0 {
            0
        } else {
            self.done * width / self.total
        };
        format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
    }
}

/// An incomplete item whose due date is strictly before `now`.
pub fn item_is_overdue(item: &ChecklistItem, now: DateTime<Utc>) -> bool {
    !item.is_completed && item.due_date.is_some_and(|due| due < now)
}

pub fn is_overdue(items: &[ChecklistItem], now: DateTime<Utc>) -> bool {
    items.iter().any(|item| item_is_overdue(item, now))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;

    fn item(completed: bool, due: Option<DateTime<Utc>>) -> ChecklistItem {
        ChecklistItem {
            id: Uuid::new_v4(),
            task_id: Uuid::nil(),
            title: "item".into(),
            due_date: due,
            is_completed: completed,
            completed_at: completed.then(Utc::now),
            position: 0,
        }
    }

    #[test]
    fn empty_checklist_is_zero_percent_and_never_overdue() {
        let progress = Progress::of(&[]);
        assert_eq!(progress.percent(), 0);
        assert_eq!(progress.label(), "0/0");
        assert_eq!(progress.bar(4), "----");
        assert!(!is_overdue(&[], Utc::now()));
    }

    #[test]
    fn ratio_counts_completed_items() {
        let items = [item(true, None), item(false, None), item(true, None)];
        let progress = Progress::of(&items);
        assert_eq!(progress, Progress { done: 2, total: 3 });
        assert_eq!(progress.percent(), 66);
        assert_eq!(progress.bar(6), "####--");
    }

    #[test]
    fn overdue_needs_an_incomplete_item_due_in_the_past() {
        let now = Utc::now();
        let past = Some(now - Duration::hours(1));
        let future = Some(now + Duration::hours(1));

        assert!(is_overdue(&[item(false, past)], now));
        assert!(!is_overdue(&[item(true, past)], now));
        assert!(!is_overdue(&[item(false, future)], now));
        assert!(!is_overdue(&[item(false, None)], now));
        assert!(!is_overdue(&[item(false, Some(now))], now));
    }

    #[test]
    fn completing_the_late_item_clears_the_flag() {
        let now = Utc::now();
        let mut items = vec![item(false, Some(now - Duration::days(2))), item(false, None)];
        assert!(is_overdue(&items, now));

        items[0].is_completed = true;
        items[0].completed_at = Some(now);
        assert!(!is_overdue(&items, now));
    }
}
