use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{task::Task, Team};

/// A project as stored. `start_date <= end_date` when both are
/// present, enforced at the validation layer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// List/detail response shape: a project with its tasks and teams
/// embedded, matching what the dashboard consumes.
#[derive(Debug, Serialize, Clone)]
pub struct ProjectWithTasks {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
    pub teams: Vec<Team>,
}
