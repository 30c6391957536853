use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use super::{check_not_blank, check_window, to_column_precision};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), AppError> {
        check_not_blank("name", &self.name)?;
        check_window(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Project {
    pub fn from_new(id: i64, new: NewProject) -> Self {
        Project {
            id,
            name: new.name,
            start_time: new.start_time.map(to_column_precision),
            end_time: new.end_time.map(to_column_precision),
        }
    }

    /// Applies the supplied fields and re-checks the result.
    pub fn apply(&mut self, patch: ProjectPatch) -> Result<(), AppError> {
        if let Some(name) = patch.name {
            check_not_blank("name", &name)?;
            self.name = name;
        }
        if patch.start_time.is_some() {
            self.start_time = patch.start_time.map(to_column_precision);
        }
        if patch.end_time.is_some() {
            self.end_time = patch.end_time.map(to_column_precision);
        }
        check_window(self.start_time, self.end_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn patch_keeps_unspecified_fields() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut project = Project {
            id: 1,
            name: "Backend".into(),
            start_time: Some(start),
            end_time: None,
        };

        project
            .apply(ProjectPatch {
                name: Some("Backend v2".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(project.name, "Backend v2");
        assert_eq!(project.start_time, Some(start));
    }

    #[test]
    fn patch_rejects_end_before_start() {
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let mut project = Project {
            id: 1,
            name: "Backend".into(),
            start_time: Some(start),
            end_time: None,
        };

        let err = project
            .apply(ProjectPatch {
                end_time: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn blank_name_is_rejected() {
        let new = NewProject { name: "  ".into(), start_time: None, end_time: None };
        assert!(new.validate().is_err());
    }
}
