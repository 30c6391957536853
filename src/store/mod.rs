//! Persistence seam for projects, sprints, tasks, users and bot messages.
//!
//! `MySqlStore` is the production backend. `MemoryStore` keeps everything in
//! process and is used by the test suite and `STORE=memory` runs.
//!
//! Both backends follow the same delete rules: a project with users cannot be
//! deleted, and its sprints and tasks go with it; deleting a sprint detaches
//! its tasks; deleting a user clears task references to it.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    BotMessage, NewMessage, NewProject, NewSprint, NewTask, NewUser, Project, ProjectPatch,
    Sprint, SprintPatch, Task, TaskFilter, TaskPatch, User, UserPatch,
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_projects(&self) -> AppResult<Vec<Project>>;
    async fn get_project(&self, id: i64) -> AppResult<Option<Project>>;
    async fn create_project(&self, new: NewProject) -> AppResult<Project>;
    async fn update_project(&self, id: i64, patch: ProjectPatch) -> AppResult<Option<Project>>;
    async fn delete_project(&self, id: i64) -> AppResult<bool>;

    async fn list_sprints(&self, project_id: Option<i64>) -> AppResult<Vec<Sprint>>;
    async fn get_sprint(&self, id: i64) -> AppResult<Option<Sprint>>;
    async fn create_sprint(&self, new: NewSprint) -> AppResult<Sprint>;
    async fn update_sprint(&self, id: i64, patch: SprintPatch) -> AppResult<Option<Sprint>>;
    async fn delete_sprint(&self, id: i64) -> AppResult<bool>;

    async fn list_tasks(&self, filter: TaskFilter) -> AppResult<Vec<Task>>;
    async fn get_task(&self, id: i64) -> AppResult<Option<Task>>;
    async fn create_task(&self, new: NewTask) -> AppResult<Task>;
    async fn update_task(&self, id: i64, patch: TaskPatch) -> AppResult<Option<Task>>;
    async fn delete_task(&self, id: i64) -> AppResult<bool>;

    async fn list_users(&self, project_id: i64, role: Option<&str>) -> AppResult<Vec<User>>;
    async fn get_user(&self, id: i64) -> AppResult<Option<User>>;
    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<User>>;
    async fn create_user(&self, new: NewUser) -> AppResult<User>;
    async fn update_user(&self, id: i64, patch: UserPatch) -> AppResult<Option<User>>;
    async fn delete_user(&self, id: i64) -> AppResult<bool>;

    async fn record_message(&self, new: NewMessage) -> AppResult<BotMessage>;
    /// Newest first; equal timestamps are ordered by id, newest first.
    async fn recent_messages(&self, telegram_id: i64, limit: i64) -> AppResult<Vec<BotMessage>>;
}
