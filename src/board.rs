// src/board.rs
//
// Task state engine behind the kanban board: status-column grouping
// and the optimistic status-change state machine.

use serde::Serialize;

use crate::models::task::{Task, TaskStatus};

/// One column per status, in board order. Statuses with no tasks are
/// present as empty columns. Columns are keyed by the status wire
/// values so clients can index the object with a task's `status`.
#[derive(Debug, Default, Serialize)]
pub struct GroupedTasks {
    #[serde(rename = "TO_DO")]
    pub to_do: Vec<Task>,
    #[serde(rename = "IN_PROGRESS")]
    pub in_progress: Vec<Task>,
    #[serde(rename = "IN_REVIEW")]
    pub in_review: Vec<Task>,
    #[serde(rename = "COMPLETED")]
    pub completed: Vec<Task>,
}

impl GroupedTasks {
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::ToDo => &self.to_do,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::InReview => &self.in_review,
            TaskStatus::Completed => &self.completed,
        }
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::ToDo => &mut self.to_do,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::InReview => &mut self.in_review,
            TaskStatus::Completed => &mut self.completed,
        }
    }
}

/// Partitions tasks into status columns, preserving the relative order
/// of the input within each column. Pure and total: every task lands
/// in exactly the column matching its status.
pub fn group_by_status(tasks: &[Task]) -> GroupedTasks {
    let mut grouped = GroupedTasks::default();
    for task in tasks {
        grouped.column_mut(task.status).push(task.clone());
    }
    grouped
}

/// Outcome reported by the store for an optimistic status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    Committed,
    Failed,
}

/// Receipt for an optimistically applied status change. Holds the
/// prior status so a failed persistence can be compensated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingChange {
    pub task_id: i64,
    pub new_status: TaskStatus,
    prior: TaskStatus,
}

/// In-memory task collection for one project's board. Status changes
/// are applied before the store confirms them; deletions are applied
/// only after the store confirms them.
#[derive(Debug, Default)]
pub struct TaskBoard {
    tasks: Vec<Task>,
}

impl TaskBoard {
    pub fn new(tasks: Vec<Task>) -> Self {
        TaskBoard { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn grouped(&self) -> GroupedTasks {
        group_by_status(&self.tasks)
    }

    /// Applies the new status immediately and returns a receipt for
    /// the in-flight persistence. Returns `None` for an unknown task.
    pub fn change_status(&mut self, task_id: i64, new_status: TaskStatus) -> Option<PendingChange> {
        let task = self.tasks.iter_mut().find(|t| t.id == task_id)?;
        let prior = task.status;
        task.status = new_status;
        Some(PendingChange {
            task_id,
            new_status,
            prior,
        })
    }

    /// Settles an optimistic change. A failure reverts the task to its
    /// prior status so local state never diverges from the store. The
    /// revert is skipped if the task was removed while the change was
    /// in flight.
    pub fn resolve(&mut self, pending: PendingChange, outcome: ChangeOutcome) {
        if outcome == ChangeOutcome::Failed {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == pending.task_id) {
                if task.status == pending.new_status {
                    task.status = pending.prior;
                }
            }
        }
    }

    /// Removes a task after the store has acknowledged its deletion.
    pub fn remove(&mut self, task_id: i64) {
        self.tasks.retain(|t| t.id != task_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskPriority;
    use chrono::{TimeZone, Utc};

    fn task(id: i64, status: TaskStatus) -> Task {
        Task {
            id,
            project_id: 7,
            title: format!("task {}", id),
            description: None,
            status,
            priority: TaskPriority::Low,
            tags: None,
            start_date: None,
            due_date: None,
            points: None,
            assigned_user_ids: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn column_ids(grouped: &GroupedTasks, status: TaskStatus) -> Vec<i64> {
        grouped.column(status).iter().map(|t| t.id).collect()
    }

    #[test]
    fn grouping_partitions_exactly() {
        let tasks = vec![
            task(1, TaskStatus::ToDo),
            task(2, TaskStatus::Completed),
            task(3, TaskStatus::ToDo),
            task(4, TaskStatus::InReview),
        ];
        let grouped = group_by_status(&tasks);

        let total: usize = TaskStatus::ALL
            .iter()
            .map(|s| grouped.column(*s).len())
            .sum();
        assert_eq!(total, tasks.len());
        for status in TaskStatus::ALL {
            assert!(grouped.column(status).iter().all(|t| t.status == status));
        }
    }

    #[test]
    fn grouping_preserves_relative_order() {
        let tasks = vec![
            task(9, TaskStatus::InProgress),
            task(4, TaskStatus::InProgress),
            task(7, TaskStatus::InProgress),
        ];
        let grouped = group_by_status(&tasks);
        assert_eq!(column_ids(&grouped, TaskStatus::InProgress), vec![9, 4, 7]);
    }

    #[test]
    fn absent_statuses_are_empty_columns() {
        let grouped = group_by_status(&[task(1, TaskStatus::ToDo)]);
        assert!(grouped.column(TaskStatus::InProgress).is_empty());
        assert!(grouped.column(TaskStatus::InReview).is_empty());
        assert!(grouped.column(TaskStatus::Completed).is_empty());
    }

    #[test]
    fn columns_serialize_under_status_wire_values() {
        let grouped = group_by_status(&[task(1, TaskStatus::ToDo)]);
        let json = serde_json::to_value(&grouped).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        for key in ["TO_DO", "IN_PROGRESS", "IN_REVIEW", "COMPLETED"] {
            assert!(obj.contains_key(key), "missing column {}", key);
        }
        assert_eq!(json["TO_DO"][0]["status"], "TO_DO");
    }

    #[test]
    fn status_change_is_applied_before_confirmation() {
        let mut board = TaskBoard::new(vec![task(1, TaskStatus::ToDo)]);
        let pending = board.change_status(1, TaskStatus::InReview).unwrap();
        assert_eq!(board.tasks()[0].status, TaskStatus::InReview);
        board.resolve(pending, ChangeOutcome::Committed);
        assert_eq!(board.tasks()[0].status, TaskStatus::InReview);
    }

    #[test]
    fn failed_change_reverts_to_prior_status() {
        let mut board = TaskBoard::new(vec![task(1, TaskStatus::ToDo)]);
        let pending = board.change_status(1, TaskStatus::Completed).unwrap();
        board.resolve(pending, ChangeOutcome::Failed);
        assert_eq!(board.tasks()[0].status, TaskStatus::ToDo);
    }

    #[test]
    fn unknown_task_yields_no_pending_change() {
        let mut board = TaskBoard::new(vec![task(1, TaskStatus::ToDo)]);
        assert!(board.change_status(99, TaskStatus::Completed).is_none());
    }

    #[test]
    fn any_transition_is_permitted() {
        let mut board = TaskBoard::new(vec![task(1, TaskStatus::Completed)]);
        let pending = board.change_status(1, TaskStatus::ToDo).unwrap();
        board.resolve(pending, ChangeOutcome::Committed);
        assert_eq!(board.tasks()[0].status, TaskStatus::ToDo);
    }

    #[test]
    fn delete_after_status_change_leaves_no_trace() {
        let mut board = TaskBoard::new(vec![
            task(1, TaskStatus::ToDo),
            task(2, TaskStatus::InProgress),
        ]);
        let pending = board.change_status(1, TaskStatus::InReview).unwrap();
        board.resolve(pending, ChangeOutcome::Committed);
        board.remove(1);

        let grouped = board.grouped();
        for status in TaskStatus::ALL {
            assert!(grouped.column(status).iter().all(|t| t.id != 1));
        }
        assert_eq!(column_ids(&grouped, TaskStatus::InProgress), vec![2]);
    }

    #[test]
    fn late_failure_after_delete_does_not_resurrect() {
        let mut board = TaskBoard::new(vec![task(1, TaskStatus::ToDo)]);
        let pending = board.change_status(1, TaskStatus::InReview).unwrap();
        board.remove(1);
        board.resolve(pending, ChangeOutcome::Failed);
        assert!(board.tasks().is_empty());
    }
}
