// src/coordinator.rs
//
// Submission guard for create/update mutations. One coordinator
// instance belongs to one form; it validates the command before the
// busy flag ever flips, rejects re-entrant submissions while a request
// is in flight, and always returns to idle on completion.

use crate::project::{CreateProjectRequest, UpdateProjectRequest};
use crate::task::{CreateTaskRequest, UpdateTaskRequest};
use crate::validation;

/// A mutation stated as data, decoupled from whatever surface
/// triggered it.
#[derive(Debug)]
pub enum Command {
    CreateProject(CreateProjectRequest),
    UpdateProject {
        id: i64,
        fields: UpdateProjectRequest,
    },
    CreateTask {
        project_id: i64,
        fields: CreateTaskRequest,
    },
    UpdateTask {
        id: i64,
        fields: UpdateTaskRequest,
    },
}

impl Command {
    /// What the mutation is doing, for "Failed to ..." messages.
    pub fn context(&self) -> &'static str {
        match self {
            Command::CreateProject(_) => "create project",
            Command::UpdateProject { .. } => "update project",
            Command::CreateTask { .. } => "create task",
            Command::UpdateTask { .. } => "update task",
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Command::CreateProject(fields) => validation::project_form(
                Some(&fields.name),
                true,
                fields.description.as_deref(),
                fields.start_date.as_deref(),
                fields.end_date.as_deref(),
            )
            .map(|_| ()),
            Command::UpdateProject { fields, .. } => validation::project_form(
                fields.name.as_deref(),
                false,
                fields.description.as_deref(),
                fields.start_date.as_deref(),
                fields.end_date.as_deref(),
            )
            .map(|_| ()),
            Command::CreateTask { fields, .. } => validation::task_form(
                &fields.title,
                fields.description.as_deref(),
                fields.status,
                fields.start_date,
                fields.due_date,
            ),
            Command::UpdateTask { fields, .. } => {
                if let Some(title) = &fields.title {
                    validation::require_text("Task title", title)?;
                }
                validation::optional_text("Description", fields.description.as_deref())?;
                validation::date_range(
                    "Start date",
                    "Due date",
                    fields.start_date,
                    fields.due_date,
                )
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// A submission is already in flight; the attempt is dropped
    /// without touching the store.
    Busy,
    /// The command failed validation; the busy flag never flipped and
    /// the store was never contacted.
    Invalid(String),
}

#[derive(Debug)]
pub struct MutationCoordinator {
    in_flight: bool,
    alive: bool,
}

impl Default for MutationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationCoordinator {
    pub fn new() -> Self {
        MutationCoordinator {
            in_flight: false,
            alive: true,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Admits a command for submission. Busy rejection comes first so
    /// a re-entrant attempt can never double-submit; validation comes
    /// before the busy flag flips so a rejected form never shows a
    /// spinner.
    pub fn begin(&mut self, command: &Command) -> Result<(), SubmitError> {
        if self.in_flight {
            return Err(SubmitError::Busy);
        }
        command.validate().map_err(SubmitError::Invalid)?;
        self.in_flight = true;
        Ok(())
    }

    /// Settles a successful submission: refresh first, close second.
    /// Callbacks are skipped once the owning context is gone, but the
    /// coordinator still returns to idle.
    pub fn succeed(&mut self, refresh: impl FnOnce(), close: impl FnOnce()) {
        if self.alive {
            refresh();
            close();
        }
        self.in_flight = false;
    }

    /// Settles a failed submission and produces the user-facing
    /// message. The coordinator returns to idle on this path too.
    pub fn fail(&mut self, command: &Command, err: &str) -> String {
        self.in_flight = false;
        if err.is_empty() {
            format!("Failed to {}", command.context())
        } else {
            format!("Failed to {}: {}", command.context(), err)
        }
    }

    /// Marks the owning context gone. A completion arriving after this
    /// point must not fire callbacks into an unmounted context.
    pub fn dismiss(&mut self) {
        self.alive = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskStatus;
    use std::cell::Cell;
    use std::cell::RefCell;

    fn project_command(name: &str) -> Command {
        Command::CreateProject(CreateProjectRequest {
            name: name.to_string(),
            description: None,
            start_date: None,
            end_date: None,
        })
    }

    fn task_command(title: &str, status: Option<TaskStatus>) -> Command {
        Command::CreateTask {
            project_id: 1,
            fields: CreateTaskRequest {
                title: title.to_string(),
                description: None,
                status,
                priority: None,
                tags: None,
                start_date: None,
                due_date: None,
                points: None,
                assigned_user_ids: None,
            },
        }
    }

    /// Stand-in for the entity store that only counts calls.
    #[derive(Default)]
    struct CountingStore {
        calls: Cell<u32>,
    }

    impl CountingStore {
        fn submit(&self) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn second_attempt_while_in_flight_makes_no_second_store_call() {
        let store = CountingStore::default();
        let mut coordinator = MutationCoordinator::new();
        let command = project_command("Apollo");

        coordinator.begin(&command).unwrap();
        store.submit();
        assert!(coordinator.is_busy());

        // The user clicks submit again before the first request lands.
        match coordinator.begin(&project_command("Apollo")) {
            Err(SubmitError::Busy) => {}
            other => panic!("expected Busy, got {:?}", other),
        }
        assert_eq!(store.calls.get(), 1);

        coordinator.succeed(|| {}, || {});
        assert!(!coordinator.is_busy());
    }

    #[test]
    fn invalid_command_never_flips_busy_or_reaches_store() {
        let store = CountingStore::default();
        let mut coordinator = MutationCoordinator::new();

        for command in [
            project_command("  "),
            task_command("", Some(TaskStatus::ToDo)),
            task_command("Write docs", None),
        ] {
            match coordinator.begin(&command) {
                Err(SubmitError::Invalid(msg)) => assert!(!msg.is_empty()),
                other => panic!("expected Invalid, got {:?}", other),
            }
            assert!(!coordinator.is_busy());
        }
        assert_eq!(store.calls.get(), 0);
    }

    #[test]
    fn refresh_runs_before_close() {
        let mut coordinator = MutationCoordinator::new();
        coordinator.begin(&project_command("Apollo")).unwrap();

        let order = RefCell::new(Vec::new());
        coordinator.succeed(
            || order.borrow_mut().push("refresh"),
            || order.borrow_mut().push("close"),
        );
        assert_eq!(*order.borrow(), vec!["refresh", "close"]);
    }

    #[test]
    fn failure_resets_state_and_formats_message() {
        let mut coordinator = MutationCoordinator::new();
        let command = project_command("Apollo");
        coordinator.begin(&command).unwrap();

        let msg = coordinator.fail(&command, "connection reset");
        assert_eq!(msg, "Failed to create project: connection reset");
        assert!(!coordinator.is_busy());

        // The form is usable again after a failure.
        assert!(coordinator.begin(&command).is_ok());
    }

    #[test]
    fn failure_without_detail_keeps_generic_message() {
        let mut coordinator = MutationCoordinator::new();
        let command = task_command("Write docs", Some(TaskStatus::ToDo));
        coordinator.begin(&command).unwrap();
        assert_eq!(coordinator.fail(&command, ""), "Failed to create task");
    }

    #[test]
    fn dismissed_coordinator_skips_callbacks_but_resets() {
        let mut coordinator = MutationCoordinator::new();
        coordinator.begin(&project_command("Apollo")).unwrap();
        coordinator.dismiss();

        let fired = Cell::new(false);
        coordinator.succeed(|| fired.set(true), || fired.set(true));
        assert!(!fired.get());
        assert!(!coordinator.is_busy());
    }
}
