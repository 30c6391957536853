use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;
use super::check_not_blank;

/// Values accepted in `User::role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Developer,
    Manager,
    Pending,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::Manager => "manager",
            Role::Pending => "pending",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "developer" => Ok(Role::Developer),
            "manager" => Ok(Role::Manager),
            "pending" => Ok(Role::Pending),
            other => Err(AppError::BadRequest(format!("unknown role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub telegram_id: Option<i64>,
    pub project_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub telegram_id: Option<i64>,
    pub project_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub title: Option<String>,
}

impl NewUser {
    /// A user registered through the bot, waiting for a manager to approve them.
    pub fn pending(telegram_id: i64, project_id: i64, first_name: &str, last_name: &str) -> Self {
        NewUser {
            telegram_id: Some(telegram_id),
            project_id,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            role: Role::Pending.as_str().to_string(),
            title: None,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        check_not_blank("first_name", &self.first_name)?;
        check_not_blank("last_name", &self.last_name)?;
        self.role.parse::<Role>().map(|_| ())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub telegram_id: Option<i64>,
    pub project_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub title: Option<String>,
}

impl UserPatch {
    pub fn role(role: Role) -> Self {
        UserPatch {
            role: Some(role.as_str().to_string()),
            ..Default::default()
        }
    }
}

impl User {
    pub fn from_new(id: i64, new: NewUser) -> Self {
        User {
            id,
            telegram_id: new.telegram_id,
            project_id: new.project_id,
            first_name: new.first_name,
            last_name: new.last_name,
            role: new.role,
            title: new.title,
        }
    }

    pub fn apply(&mut self, patch: UserPatch) -> Result<(), AppError> {
        if let Some(first_name) = patch.first_name {
            check_not_blank("first_name", &first_name)?;
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            check_not_blank("last_name", &last_name)?;
            self.last_name = last_name;
        }
        if let Some(role) = patch.role {
            self.role = role.parse::<Role>()?.as_str().to_string();
        }
        if patch.telegram_id.is_some() {
            self.telegram_id = patch.telegram_id;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if patch.title.is_some() {
            self.title = patch.title;
        }
        Ok(())
    }

    /// Unknown role strings are treated as pending.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Pending)
    }

    pub fn is_manager(&self) -> bool {
        self.role() == Role::Manager
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
