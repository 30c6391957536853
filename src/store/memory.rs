//! In-process store backed by ordered maps.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::{
    BotMessage, NewMessage, NewProject, NewSprint, NewTask, NewUser, Project, ProjectPatch,
    Sprint, SprintPatch, Task, TaskFilter, TaskPatch, User, UserPatch,
};
use super::Store;

#[derive(Default)]
struct Tables {
    next_id: i64,
    projects: BTreeMap<i64, Project>,
    sprints: BTreeMap<i64, Sprint>,
    tasks: BTreeMap<i64, Task>,
    users: BTreeMap<i64, User>,
    messages: BTreeMap<i64, BotMessage>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store that lives for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        Ok(self.tables.read().await.projects.values().cloned().collect())
    }

    async fn get_project(&self, id: i64) -> AppResult<Option<Project>> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn create_project(&self, new: NewProject) -> AppResult<Project> {
        let mut tables = self.tables.write().await;
        let project = Project::from_new(tables.next_id(), new);
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: i64, patch: ProjectPatch) -> AppResult<Option<Project>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.projects.get(&id) else {
            return Ok(None);
        };
        let mut updated = current.clone();
        updated.apply(patch)?;
        tables.projects.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_project(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.projects.contains_key(&id) {
            return Ok(false);
        }
        if tables.users.values().any(|u| u.project_id == id) {
            return Err(AppError::BadRequest(format!("Project {} still has users", id)));
        }
        tables.tasks.retain(|_, t| t.project_id != id);
        tables.sprints.retain(|_, s| s.project_id != id);
        tables.projects.remove(&id);
        Ok(true)
    }

    async fn list_sprints(&self, project_id: Option<i64>) -> AppResult<Vec<Sprint>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sprints
            .values()
            .filter(|s| project_id.map_or(true, |p| s.project_id == p))
            .cloned()
            .collect())
    }

    async fn get_sprint(&self, id: i64) -> AppResult<Option<Sprint>> {
        Ok(self.tables.read().await.sprints.get(&id).cloned())
    }

    async fn create_sprint(&self, new: NewSprint) -> AppResult<Sprint> {
        let mut tables = self.tables.write().await;
        let sprint = Sprint::from_new(tables.next_id(), new);
        tables.sprints.insert(sprint.id, sprint.clone());
        Ok(sprint)
    }

    async fn update_sprint(&self, id: i64, patch: SprintPatch) -> AppResult<Option<Sprint>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.sprints.get(&id) else {
            return Ok(None);
        };
        let mut updated = current.clone();
        updated.apply(patch)?;
        tables.sprints.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_sprint(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.sprints.remove(&id).is_none() {
            return Ok(false);
        }
        for task in tables.tasks.values_mut().filter(|t| t.sprint_id == Some(id)) {
            task.sprint_id = None;
        }
        Ok(true)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> AppResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.values().filter(|t| filter.matches(t)).cloned().collect())
    }

    async fn get_task(&self, id: i64) -> AppResult<Option<Task>> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn create_task(&self, new: NewTask) -> AppResult<Task> {
        let mut tables = self.tables.write().await;
        let task = Task::from_new(tables.next_id(), Utc::now(), new);
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: i64, patch: TaskPatch) -> AppResult<Option<Task>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.tasks.get(&id) else {
            return Ok(None);
        };
        let mut updated = current.clone();
        updated.apply(patch)?;
        tables.tasks.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_task(&self, id: i64) -> AppResult<bool> {
        Ok(self.tables.write().await.tasks.remove(&id).is_some())
    }

    async fn list_users(&self, project_id: i64, role: Option<&str>) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| u.project_id == project_id)
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect())
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.telegram_id == Some(telegram_id))
            .cloned())
    }

    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        let user = User::from_new(tables.next_id(), new);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> AppResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.users.get(&id) else {
            return Ok(None);
        };
        let mut updated = current.clone();
        updated.apply(patch)?;
        tables.users.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_user(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        for task in tables.tasks.values_mut() {
            if task.created_by == Some(id) {
                task.created_by = None;
            }
            if task.assigned_to == Some(id) {
                task.assigned_to = None;
            }
        }
        Ok(true)
    }

    async fn record_message(&self, new: NewMessage) -> AppResult<BotMessage> {
        let mut tables = self.tables.write().await;
        let message = BotMessage::from_new(tables.next_id(), Utc::now(), new);
        tables.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn recent_messages(&self, telegram_id: i64, limit: i64) -> AppResult<Vec<BotMessage>> {
        let tables = self.tables.read().await;
        let mut messages: Vec<BotMessage> = tables
            .messages
            .values()
            .filter(|m| m.telegram_id == telegram_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        messages.truncate(limit.max(0) as usize);
        Ok(messages)
    }
}
