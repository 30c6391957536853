use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use super::{check_not_blank, to_column_precision};

/// Values accepted in `Task::status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(AppError::BadRequest(format!("unknown task status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub created_by: Option<i64>,
    pub assigned_to: Option<i64>,
    pub estimate_hours: Option<f64>,
    pub real_hours: Option<f64>,
    pub sprint_id: Option<i64>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub project_id: i64,
    pub description: String,
    pub status: Option<String>,
    pub created_by: Option<i64>,
    pub assigned_to: Option<i64>,
    pub estimate_hours: Option<f64>,
    pub real_hours: Option<f64>,
    pub sprint_id: Option<i64>,
    pub category: Option<String>,
}

impl NewTask {
    /// A bare task as created from chat: todo, owned and assigned by one user.
    pub fn from_chat(project_id: i64, user_id: i64, description: &str) -> Self {
        NewTask {
            project_id,
            description: description.trim().to_string(),
            status: None,
            created_by: Some(user_id),
            assigned_to: Some(user_id),
            estimate_hours: None,
            real_hours: None,
            sprint_id: None,
            category: None,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        check_not_blank("description", &self.description)?;
        if let Some(status) = &self.status {
            status.parse::<TaskStatus>()?;
        }
        check_hours("estimate_hours", self.estimate_hours)?;
        check_hours("real_hours", self.real_hours)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<i64>,
    pub estimate_hours: Option<f64>,
    pub real_hours: Option<f64>,
    pub sprint_id: Option<i64>,
    pub category: Option<String>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        TaskPatch {
            status: Some(status.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn assign(user_id: i64) -> Self {
        TaskPatch {
            assigned_to: Some(user_id),
            ..Default::default()
        }
    }
}

/// Filters for task listings; unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub project_id: Option<i64>,
    pub sprint_id: Option<i64>,
    pub assigned_to: Option<i64>,
    pub status: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.project_id.map_or(true, |id| task.project_id == id)
            && self.sprint_id.map_or(true, |id| task.sprint_id == Some(id))
            && self.assigned_to.map_or(true, |id| task.assigned_to == Some(id))
            && self.status.as_deref().map_or(true, |s| task.status == s)
    }
}

impl Task {
    pub fn from_new(id: i64, created_at: DateTime<Utc>, new: NewTask) -> Self {
        Task {
            id,
            project_id: new.project_id,
            description: new.description,
            created_at: to_column_precision(created_at),
            status: new.status.unwrap_or_else(|| TaskStatus::Todo.as_str().to_string()),
            created_by: new.created_by,
            assigned_to: new.assigned_to,
            estimate_hours: new.estimate_hours,
            real_hours: new.real_hours,
            sprint_id: new.sprint_id,
            category: new.category,
        }
    }

    pub fn apply(&mut self, patch: TaskPatch) -> Result<(), AppError> {
        if let Some(description) = patch.description {
            check_not_blank("description", &description)?;
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status.parse::<TaskStatus>()?.as_str().to_string();
        }
        if patch.assigned_to.is_some() {
            self.assigned_to = patch.assigned_to;
        }
        if patch.estimate_hours.is_some() {
            check_hours("estimate_hours", patch.estimate_hours)?;
            self.estimate_hours = patch.estimate_hours;
        }
        if patch.real_hours.is_some() {
            check_hours("real_hours", patch.real_hours)?;
            self.real_hours = patch.real_hours;
        }
        if patch.sprint_id.is_some() {
            self.sprint_id = patch.sprint_id;
        }
        if patch.category.is_some() {
            self.category = patch.category;
        }
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done.as_str()
    }
}

fn check_hours(field: &str, hours: Option<f64>) -> Result<(), AppError> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => {
            Err(AppError::BadRequest(format!("{} must be a non-negative number", field)))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task() -> Task {
        Task::from_new(7, Utc::now(), NewTask::from_chat(1, 2, "  write docs "))
    }

    #[test]
    fn chat_tasks_start_as_todo() {
        let t = task();
        assert_eq!(t.status, "todo");
        assert_eq!(t.description, "write docs");
        assert_eq!(t.created_by, Some(2));
        assert_eq!(t.assigned_to, Some(2));
    }

    #[test]
    fn status_is_normalized() {
        let mut t = task();
        t.apply(TaskPatch { status: Some("DONE".into()), ..Default::default() }).unwrap();
        assert!(t.is_done());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut t = task();
        assert!(t.apply(TaskPatch { status: Some("blocked".into()), ..Default::default() }).is_err());
        assert_eq!(t.status, "todo");
    }

    #[test]
    fn negative_hours_are_rejected() {
        let mut new = NewTask::from_chat(1, 2, "estimate me");
        new.estimate_hours = Some(-1.0);
        assert!(new.validate().is_err());
    }

    #[test]
    fn filter_matches_on_every_set_field() {
        let t = task();
        let filter = TaskFilter { project_id: Some(1), assigned_to: Some(2), ..Default::default() };
        assert!(filter.matches(&t));
        let filter = TaskFilter { status: Some("done".into()), ..Default::default() };
        assert!(!filter.matches(&t));
    }

    #[test]
    fn created_at_fits_the_column() {
        let at = Utc.timestamp_opt(1_700_000_000, 987_654_321).unwrap();
        let t = Task::from_new(1, at, NewTask::from_chat(1, 1, "stamp"));
        assert_eq!(t.created_at.timestamp_subsec_nanos(), 987_654_000);
    }
}
