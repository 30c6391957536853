use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::{MySql, QueryBuilder};

use crate::error::{AppError, AppResult};
use crate::models::{
    BotMessage, NewMessage, NewProject, NewSprint, NewTask, NewUser, Project, ProjectPatch,
    Sprint, SprintPatch, Task, TaskFilter, TaskPatch, User, UserPatch,
};
use super::Store;

const SCHEMA: &str = include_str!("../../schema.sql");

const PROJECT_COLUMNS: &str = "SELECT id, name, start_time, end_time FROM Projects_";
const SPRINT_COLUMNS: &str =
    "SELECT id, project_id, name, description, start_time, end_time FROM Sprints_";
const TASK_COLUMNS: &str = "SELECT id, project_id, description, created_at, status, created_by, \
     assigned_to, estimate_hours, real_hours, sprint_id, category FROM Tasks_";
const USER_COLUMNS: &str =
    "SELECT id, telegram_id, project_id, first_name, last_name, role, title FROM Users_";
const MESSAGE_COLUMNS: &str =
    "SELECT id, telegram_id, chat_id, sender, text, prompt, created_at FROM BotMessages_";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlStore { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates any missing tables. Existing tables are left alone.
    pub async fn apply_schema(&self) -> AppResult<()> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn list_projects(&self) -> AppResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!("{} ORDER BY id", PROJECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(projects)
    }

    async fn get_project(&self, id: i64) -> AppResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!("{} WHERE id = ?", PROJECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn create_project(&self, new: NewProject) -> AppResult<Project> {
        let result = sqlx::query("INSERT INTO Projects_ (name, start_time, end_time) VALUES (?, ?, ?)")
            .bind(&new.name)
            .bind(new.start_time)
            .bind(new.end_time)
            .execute(&self.pool)
            .await?;
        Ok(Project::from_new(result.last_insert_id() as i64, new))
    }

    async fn update_project(&self, id: i64, patch: ProjectPatch) -> AppResult<Option<Project>> {
        let Some(mut project) = self.get_project(id).await? else {
            return Ok(None);
        };
        project.apply(patch)?;
        sqlx::query("UPDATE Projects_ SET name = ?, start_time = ?, end_time = ? WHERE id = ?")
            .bind(&project.name)
            .bind(project.start_time)
            .bind(project.end_time)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(Some(project))
    }

    async fn delete_project(&self, id: i64) -> AppResult<bool> {
        let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Users_ WHERE project_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if users > 0 {
            return Err(AppError::BadRequest(format!("Project {} still has users", id)));
        }
        let result = sqlx::query("DELETE FROM Projects_ WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_sprints(&self, project_id: Option<i64>) -> AppResult<Vec<Sprint>> {
        let mut query = QueryBuilder::<MySql>::new(SPRINT_COLUMNS);
        if let Some(project_id) = project_id {
            query.push(" WHERE project_id = ").push_bind(project_id);
        }
        query.push(" ORDER BY id");
        let sprints = query.build_query_as::<Sprint>().fetch_all(&self.pool).await?;
        Ok(sprints)
    }

    async fn get_sprint(&self, id: i64) -> AppResult<Option<Sprint>> {
        let sprint = sqlx::query_as::<_, Sprint>(&format!("{} WHERE id = ?", SPRINT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sprint)
    }

    async fn create_sprint(&self, new: NewSprint) -> AppResult<Sprint> {
        let result = sqlx::query(
            "INSERT INTO Sprints_ (project_id, name, description, start_time, end_time) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new.project_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.start_time)
        .bind(new.end_time)
        .execute(&self.pool)
        .await?;
        Ok(Sprint::from_new(result.last_insert_id() as i64, new))
    }

    async fn update_sprint(&self, id: i64, patch: SprintPatch) -> AppResult<Option<Sprint>> {
        let Some(mut sprint) = self.get_sprint(id).await? else {
            return Ok(None);
        };
        sprint.apply(patch)?;
        sqlx::query(
            "UPDATE Sprints_ SET name = ?, description = ?, start_time = ?, end_time = ? WHERE id = ?",
        )
        .bind(&sprint.name)
        .bind(&sprint.description)
        .bind(sprint.start_time)
        .bind(sprint.end_time)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(sprint))
    }

    async fn delete_sprint(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM Sprints_ WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> AppResult<Vec<Task>> {
        let mut query = QueryBuilder::<MySql>::new(TASK_COLUMNS);
        query.push(" WHERE 1 = 1");
        if let Some(project_id) = filter.project_id {
            query.push(" AND project_id = ").push_bind(project_id);
        }
        if let Some(sprint_id) = filter.sprint_id {
            query.push(" AND sprint_id = ").push_bind(sprint_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            query.push(" AND assigned_to = ").push_bind(assigned_to);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY id");
        debug!("Listing tasks: {}", query.sql());
        let tasks = query.build_query_as::<Task>().fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    async fn get_task(&self, id: i64) -> AppResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!("{} WHERE id = ?", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn create_task(&self, new: NewTask) -> AppResult<Task> {
        let created_at = Utc::now();
        let task = Task::from_new(0, created_at, new);
        let result = sqlx::query(
            "INSERT INTO Tasks_ (project_id, description, created_at, status, created_by, assigned_to, \
             estimate_hours, real_hours, sprint_id, category) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.project_id)
        .bind(&task.description)
        .bind(task.created_at)
        .bind(&task.status)
        .bind(task.created_by)
        .bind(task.assigned_to)
        .bind(task.estimate_hours)
        .bind(task.real_hours)
        .bind(task.sprint_id)
        .bind(&task.category)
        .execute(&self.pool)
        .await?;
        Ok(Task { id: result.last_insert_id() as i64, ..task })
    }

    async fn update_task(&self, id: i64, patch: TaskPatch) -> AppResult<Option<Task>> {
        let Some(mut task) = self.get_task(id).await? else {
            return Ok(None);
        };
        task.apply(patch)?;
        sqlx::query(
            "UPDATE Tasks_ SET description = ?, status = ?, assigned_to = ?, estimate_hours = ?, \
             real_hours = ?, sprint_id = ?, category = ? WHERE id = ?",
        )
        .bind(&task.description)
        .bind(&task.status)
        .bind(task.assigned_to)
        .bind(task.estimate_hours)
        .bind(task.real_hours)
        .bind(task.sprint_id)
        .bind(&task.category)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(task))
    }

    async fn delete_task(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM Tasks_ WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, project_id: i64, role: Option<&str>) -> AppResult<Vec<User>> {
        let mut query = QueryBuilder::<MySql>::new(USER_COLUMNS);
        query.push(" WHERE project_id = ").push_bind(project_id);
        if let Some(role) = role {
            query.push(" AND role = ").push_bind(role.to_string());
        }
        query.push(" ORDER BY id");
        let users = query.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE telegram_id = ?", USER_COLUMNS))
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let result = sqlx::query(
            "INSERT INTO Users_ (telegram_id, project_id, first_name, last_name, role, title) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(new.telegram_id)
        .bind(new.project_id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.role)
        .bind(&new.title)
        .execute(&self.pool)
        .await?;
        Ok(User::from_new(result.last_insert_id() as i64, new))
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> AppResult<Option<User>> {
        let Some(mut user) = self.get_user(id).await? else {
            return Ok(None);
        };
        user.apply(patch)?;
        sqlx::query(
            "UPDATE Users_ SET telegram_id = ?, project_id = ?, first_name = ?, last_name = ?, \
             role = ?, title = ? WHERE id = ?",
        )
        .bind(user.telegram_id)
        .bind(user.project_id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.role)
        .bind(&user.title)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(user))
    }

    async fn delete_user(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM Users_ WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_message(&self, new: NewMessage) -> AppResult<BotMessage> {
        let message = BotMessage::from_new(0, Utc::now(), new);
        let result = sqlx::query(
            "INSERT INTO BotMessages_ (telegram_id, chat_id, sender, text, prompt, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(message.telegram_id)
        .bind(message.chat_id)
        .bind(&message.sender)
        .bind(&message.text)
        .bind(&message.prompt)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(BotMessage {
            id: result.last_insert_id() as i64,
            ..message
        })
    }

    async fn recent_messages(&self, telegram_id: i64, limit: i64) -> AppResult<Vec<BotMessage>> {
        let messages = sqlx::query_as::<_, BotMessage>(&format!(
            "{} WHERE telegram_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
            MESSAGE_COLUMNS
        ))
        .bind(telegram_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }
}
