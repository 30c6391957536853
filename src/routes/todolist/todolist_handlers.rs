use actix_web::{web, HttpResponse};
use log::info;

use crate::error::{AppError, AppResult};
use crate::models::{NewTask, TaskFilter, TaskPatch, TaskStatus};
use crate::store::Store;
use super::todolist_models::DeleteTaskResponse;

/// Checks that a task's sprint and people belong to its project.
async fn check_task_refs(
    store: &dyn Store,
    project_id: i64,
    sprint_id: Option<i64>,
    user_ids: &[Option<i64>],
) -> AppResult<()> {
    if let Some(sprint_id) = sprint_id {
        match store.get_sprint(sprint_id).await? {
            Some(sprint) if sprint.project_id == project_id => {}
            _ => {
                return Err(AppError::BadRequest(format!(
                    "Sprint {} does not belong to project {}",
                    sprint_id, project_id
                )))
            }
        }
    }
    for user_id in user_ids.iter().flatten() {
        match store.get_user(*user_id).await? {
            Some(user) if user.project_id == project_id => {}
            _ => {
                return Err(AppError::BadRequest(format!(
                    "User {} is not a member of project {}",
                    user_id, project_id
                )))
            }
        }
    }
    Ok(())
}

pub async fn list_tasks(
    store: web::Data<dyn Store>,
    query: web::Query<TaskFilter>,
) -> AppResult<HttpResponse> {
    let mut filter = query.into_inner();
    if let Some(status) = &filter.status {
        filter.status = Some(status.parse::<TaskStatus>()?.as_str().to_string());
    }
    let tasks = store.list_tasks(filter).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

pub async fn get_task(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let task = store
        .get_task(id)
        .await?
        .ok_or_else(|| AppError::not_found("Task", id))?;
    Ok(HttpResponse::Ok().json(task))
}

pub async fn add_task(
    store: web::Data<dyn Store>,
    request: web::Json<NewTask>,
) -> AppResult<HttpResponse> {
    let mut new = request.into_inner();
    new.validate()?;
    if let Some(status) = &new.status {
        new.status = Some(status.parse::<TaskStatus>()?.as_str().to_string());
    }
    if store.get_project(new.project_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "Project {} does not exist",
            new.project_id
        )));
    }
    check_task_refs(
        store.get_ref(),
        new.project_id,
        new.sprint_id,
        &[new.created_by, new.assigned_to],
    )
    .await?;

    let task = store.create_task(new).await?;
    info!("Task {} created in project {}", task.id, task.project_id);
    Ok(HttpResponse::Created()
        .insert_header(("location", task.id.to_string()))
        .json(task))
}

pub async fn update_task(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
    request: web::Json<TaskPatch>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let patch = request.into_inner();
    let current = store
        .get_task(id)
        .await?
        .ok_or_else(|| AppError::not_found("Task", id))?;
    check_task_refs(
        store.get_ref(),
        current.project_id,
        patch.sprint_id,
        &[patch.assigned_to],
    )
    .await?;

    let task = store
        .update_task(id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("Task", id))?;
    info!("Task {} updated", id);
    Ok(HttpResponse::Ok().json(task))
}

pub async fn delete_task(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if !store.delete_task(id).await? {
        return Err(AppError::not_found("Task", id));
    }
    info!("Task {} deleted", id);
    Ok(HttpResponse::Ok().json(DeleteTaskResponse {
        success: true,
        message: "Task deleted successfully".into(),
    }))
}
