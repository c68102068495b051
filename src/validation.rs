// src/validation.rs
//
// Form validation applied uniformly before any mutation reaches the
// store. A failed check answers with a human-readable message and the
// store is never contacted.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;

use crate::models::task::TaskStatus;

/// Parsed project date pair, ready for persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectDates {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

pub fn require_text(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", label))
    } else {
        Ok(())
    }
}

/// A field may be absent, but if the client sends it, it must not be
/// blank.
pub fn optional_text(label: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) if v.trim().is_empty() => Err(format!("{} must not be blank", label)),
        _ => Ok(()),
    }
}

// Intentionally loose: one @, something on each side, a dot in the
// domain part. Compiled once and reused across requests.
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

pub fn email_shape(email: &str) -> Result<(), String> {
    let re = EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"));
    if re.is_match(email) {
        Ok(())
    } else {
        Err("Invalid email address".to_string())
    }
}

/// Both dates must be set together, and the range must be ordered.
pub fn date_range(
    start_label: &str,
    end_label: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), String> {
    match (start, end) {
        (Some(s), Some(e)) if s > e => {
            Err(format!("{} must not be after {}", start_label, end_label))
        }
        (Some(_), None) | (None, Some(_)) => Err(format!(
            "{} and {} must be set together",
            start_label, end_label
        )),
        _ => Ok(()),
    }
}

/// Parses a `YYYY-MM-DD` form field. The browser form submits an empty
/// string for an untouched date input; treat that as unset.
pub fn parse_form_date(label: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    let raw = match value {
        Some(v) if !v.trim().is_empty() => v.trim(),
        _ => return Ok(None),
    };
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("{} must be a YYYY-MM-DD date", label))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("{} is out of range", label))?;
    Ok(Some(Utc.from_utc_datetime(&midnight)))
}

/// Validates the project create/update form and parses its dates.
pub fn project_form(
    name: Option<&str>,
    name_required: bool,
    description: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<ProjectDates, String> {
    match name {
        Some(n) => require_text("Project name", n)?,
        None if name_required => return Err("Project name is required".to_string()),
        None => {}
    }
    optional_text("Description", description)?;
    let start = parse_form_date("Start date", start_date)?;
    let end = parse_form_date("End date", end_date)?;
    date_range("Start date", "End date", start, end)?;
    Ok(ProjectDates { start, end })
}

/// Validates the task create/edit form.
pub fn task_form(
    title: &str,
    description: Option<&str>,
    status: Option<TaskStatus>,
    start_date: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
) -> Result<(), String> {
    require_text("Task title", title)?;
    optional_text("Description", description)?;
    if status.is_none() {
        return Err("Please select a task status".to_string());
    }
    date_range("Start date", "Due date", start_date, due_date)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(project_form(Some("   "), true, None, None, None).is_err());
        assert!(project_form(None, true, None, None, None).is_err());
    }

    #[test]
    fn name_optional_on_update() {
        assert!(project_form(None, false, None, None, None).is_ok());
    }

    #[test]
    fn provided_blank_description_is_rejected() {
        assert!(project_form(Some("Apollo"), true, Some(""), None, None).is_err());
        assert!(task_form("Write docs", Some("  "), Some(TaskStatus::ToDo), None, None).is_err());
    }

    #[test]
    fn lone_date_is_rejected() {
        assert!(project_form(Some("Apollo"), true, None, Some("2025-03-01"), None).is_err());
        assert!(project_form(Some("Apollo"), true, None, None, Some("2025-03-09")).is_err());
        assert!(task_form("T", None, Some(TaskStatus::ToDo), Some(day(1)), None).is_err());
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(
            project_form(Some("Apollo"), true, None, Some("2025-03-09"), Some("2025-03-01"))
                .is_err()
        );
        assert!(task_form("T", None, Some(TaskStatus::ToDo), Some(day(9)), Some(day(1))).is_err());
    }

    #[test]
    fn valid_project_form_parses_dates() {
        let dates =
            project_form(Some("Apollo"), true, Some("Moon"), Some("2025-03-01"), Some("2025-03-09"))
                .unwrap();
        assert_eq!(dates.start, Some(day(1)));
        assert_eq!(dates.end, Some(day(9)));
    }

    #[test]
    fn empty_string_dates_count_as_unset() {
        let dates = project_form(Some("Apollo"), true, None, Some(""), Some("")).unwrap();
        assert_eq!(dates, ProjectDates { start: None, end: None });
    }

    #[test]
    fn task_without_status_is_rejected() {
        assert!(task_form("T", None, None, None, None).is_err());
    }

    #[test]
    fn email_shape_check() {
        assert!(email_shape("jane@example.com").is_ok());
        assert!(email_shape("not-an-email").is_err());
        assert!(email_shape("two@@example.com").is_err());
    }
}
