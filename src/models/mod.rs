pub mod project;
pub mod task;
pub mod user;

use serde::{Deserialize, Serialize};

/// Represents a team that can be assigned to projects.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Team {
    pub id: i64,
    pub name: String,
}

/// Join table mapping a team to a project.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProjectTeam {
    pub project_id: i64,
    pub team_id: i64,
}
