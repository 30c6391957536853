use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use super::{check_not_blank, check_window, to_column_precision};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sprint {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSprint {
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl NewSprint {
    pub fn validate(&self) -> Result<(), AppError> {
        check_not_blank("name", &self.name)?;
        check_window(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SprintPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Sprint {
    pub fn from_new(id: i64, new: NewSprint) -> Self {
        Sprint {
            id,
            project_id: new.project_id,
            name: new.name,
            description: new.description,
            start_time: new.start_time.map(to_column_precision),
            end_time: new.end_time.map(to_column_precision),
        }
    }

    pub fn apply(&mut self, patch: SprintPatch) -> Result<(), AppError> {
        if let Some(name) = patch.name {
            check_not_blank("name", &name)?;
            self.name = name;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if patch.start_time.is_some() {
            self.start_time = patch.start_time.map(to_column_precision);
        }
        if patch.end_time.is_some() {
            self.end_time = patch.end_time.map(to_column_precision);
        }
        check_window(self.start_time, self.end_time)
    }

    /// Whether `now` falls inside the sprint window. Open ends count as unbounded.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start_time.map_or(true, |start| start <= now)
            && self.end_time.map_or(true, |end| now <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sprint() -> Sprint {
        Sprint {
            id: 3,
            project_id: 1,
            name: "Sprint 1".into(),
            description: Some("setup".into()),
            start_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
            end_time: Some(Utc.with_ymd_and_hms(2024, 5, 14, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn description_only_patch() {
        let mut s = sprint();
        s.apply(SprintPatch {
            description: Some("hardening".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.description.as_deref(), Some("hardening"));
        assert_eq!(s.name, "Sprint 1");
    }

    #[test]
    fn active_window() {
        let s = sprint();
        assert!(s.is_active(Utc.with_ymd_and_hms(2024, 5, 7, 12, 0, 0).unwrap()));
        assert!(!s.is_active(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
    }
}
