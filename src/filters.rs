// src/filters.rs
//
// Derived project status plus the filter/sort pass behind the project
// list. The derived status is computed on demand from the task
// collection and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::project::ProjectWithTasks;
use crate::models::task::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "No Tasks")]
    NoTasks,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl ProjectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::NoTasks => "No Tasks",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
        }
    }
}

/// "No Tasks" for an empty collection, "Completed" when every task is
/// completed, otherwise "In Progress".
pub fn derived_status(tasks: &[Task]) -> ProjectStatus {
    if tasks.is_empty() {
        ProjectStatus::NoTasks
    } else if tasks.iter().all(|t| t.status == TaskStatus::Completed) {
        ProjectStatus::Completed
    } else {
        ProjectStatus::InProgress
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query-string criteria for `GET /projects`. The two sort orders are
/// mutually exclusive: task-count order always takes precedence when
/// both are supplied.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListCriteria {
    pub status: Option<ProjectStatus>,
    pub task_count_order: Option<SortOrder>,
    pub due_date_order: Option<SortOrder>,
}

/// Filters by derived status, then applies at most one comparator.
/// The sort is stable; projects without an end date compare as maximal
/// (last ascending, first descending).
pub fn filter_and_sort(
    mut projects: Vec<ProjectWithTasks>,
    criteria: &ListCriteria,
) -> Vec<ProjectWithTasks> {
    if let Some(status) = criteria.status {
        projects.retain(|p| derived_status(&p.tasks) == status);
    }

    if let Some(order) = criteria.task_count_order {
        projects.sort_by(|a, b| {
            let ord = a.tasks.len().cmp(&b.tasks.len());
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    } else if let Some(order) = criteria.due_date_order {
        projects.sort_by(|a, b| {
            let ord = end_date_key(a).cmp(&end_date_key(b));
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }

    projects
}

fn end_date_key(project: &ProjectWithTasks) -> DateTime<Utc> {
    project.project.end_date.unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::Project;
    use crate::models::task::TaskPriority;
    use chrono::TimeZone;

    fn task(id: i64, status: TaskStatus) -> Task {
        Task {
            id,
            project_id: 1,
            title: format!("task {}", id),
            description: None,
            status,
            priority: TaskPriority::Medium,
            tags: None,
            start_date: None,
            due_date: None,
            points: None,
            assigned_user_ids: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn project(id: i64, end_day: Option<u32>, tasks: Vec<Task>) -> ProjectWithTasks {
        ProjectWithTasks {
            project: Project {
                id,
                name: format!("project {}", id),
                description: None,
                start_date: None,
                end_date: end_day.map(|d| Utc.with_ymd_and_hms(2025, 6, d, 0, 0, 0).unwrap()),
                created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            },
            tasks,
            teams: vec![],
        }
    }

    fn ids(projects: &[ProjectWithTasks]) -> Vec<i64> {
        projects.iter().map(|p| p.project.id).collect()
    }

    #[test]
    fn derived_status_truth_table() {
        assert_eq!(derived_status(&[]), ProjectStatus::NoTasks);
        assert_eq!(
            derived_status(&[task(1, TaskStatus::Completed), task(2, TaskStatus::Completed)]),
            ProjectStatus::Completed
        );
        assert_eq!(
            derived_status(&[task(1, TaskStatus::Completed), task(2, TaskStatus::InReview)]),
            ProjectStatus::InProgress
        );
        assert_eq!(derived_status(&[task(1, TaskStatus::ToDo)]), ProjectStatus::InProgress);
    }

    #[test]
    fn status_filter_uses_derived_status() {
        let projects = vec![
            project(1, None, vec![task(1, TaskStatus::Completed), task(2, TaskStatus::Completed)]),
            project(2, None, vec![]),
            project(3, None, vec![task(3, TaskStatus::ToDo)]),
        ];
        let criteria = ListCriteria {
            status: Some(ProjectStatus::Completed),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(projects.clone(), &criteria)), vec![1]);

        let criteria = ListCriteria {
            status: Some(ProjectStatus::NoTasks),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(projects, &criteria)), vec![2]);
    }

    #[test]
    fn task_count_order_wins_over_due_date_order() {
        // 1 has the latest end date but the fewest tasks.
        let projects = vec![
            project(1, Some(30), vec![]),
            project(2, Some(1), vec![task(1, TaskStatus::ToDo), task(2, TaskStatus::ToDo)]),
            project(3, Some(15), vec![task(3, TaskStatus::ToDo)]),
        ];
        let criteria = ListCriteria {
            status: None,
            task_count_order: Some(SortOrder::Asc),
            due_date_order: Some(SortOrder::Desc),
        };
        assert_eq!(ids(&filter_and_sort(projects, &criteria)), vec![1, 3, 2]);
    }

    #[test]
    fn missing_end_dates_sort_last_ascending_first_descending() {
        let projects = vec![
            project(1, None, vec![]),
            project(2, Some(20), vec![]),
            project(3, Some(5), vec![]),
            project(4, None, vec![]),
        ];
        let asc = ListCriteria {
            due_date_order: Some(SortOrder::Asc),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(projects.clone(), &asc)), vec![3, 2, 1, 4]);

        let desc = ListCriteria {
            due_date_order: Some(SortOrder::Desc),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(projects, &desc)), vec![1, 4, 2, 3]);
    }

    #[test]
    fn reapplying_identical_criteria_is_idempotent() {
        let projects = vec![
            project(1, Some(10), vec![task(1, TaskStatus::ToDo)]),
            project(2, None, vec![]),
            project(3, Some(2), vec![task(2, TaskStatus::Completed)]),
        ];
        let criteria = ListCriteria {
            status: None,
            task_count_order: None,
            due_date_order: Some(SortOrder::Asc),
        };
        let once = filter_and_sort(projects, &criteria);
        let twice = filter_and_sort(once.clone(), &criteria);
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn equal_keys_preserve_input_order() {
        let projects = vec![
            project(5, Some(10), vec![]),
            project(6, Some(10), vec![]),
            project(7, Some(10), vec![]),
        ];
        let criteria = ListCriteria {
            due_date_order: Some(SortOrder::Asc),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(projects, &criteria)), vec![5, 6, 7]);
    }
}
