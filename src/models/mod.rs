// src/models/mod.rs

pub mod project;
pub mod sprint;
pub mod task;
pub mod user;
pub mod message;

pub use message::{BotMessage, NewMessage};
pub use project::{NewProject, Project, ProjectPatch};
pub use sprint::{NewSprint, Sprint, SprintPatch};
pub use task::{NewTask, Task, TaskFilter, TaskPatch, TaskStatus};
pub use user::{NewUser, Role, User, UserPatch};

use chrono::{DateTime, SubsecRound, Utc};
use crate::error::AppError;

pub(crate) fn check_not_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub(crate) fn check_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(AppError::BadRequest(
            "end_time must not be before start_time".into(),
        )),
        _ => Ok(()),
    }
}

/// Drops precision the `TIMESTAMP(6)` columns cannot hold, so a row read back
/// equals the row that was written.
pub(crate) fn to_column_precision(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn column_precision_keeps_microseconds() {
        let time = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        assert_eq!(to_column_precision(time).timestamp_subsec_nanos(), 123_456_000);
    }
}
