use actix_web::{web, HttpResponse};
use log::info;

use crate::error::{AppError, AppResult};
use crate::models::{NewSprint, SprintPatch, TaskFilter};
use crate::store::Store;
use super::sprints_models::{DeleteSprintResponse, SprintListQuery};

pub async fn list_sprints(
    store: web::Data<dyn Store>,
    query: web::Query<SprintListQuery>,
) -> AppResult<HttpResponse> {
    let sprints = store.list_sprints(query.project_id).await?;
    Ok(HttpResponse::Ok().json(sprints))
}

pub async fn get_sprint(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let sprint = store
        .get_sprint(id)
        .await?
        .ok_or_else(|| AppError::not_found("Sprint", id))?;
    Ok(HttpResponse::Ok().json(sprint))
}

pub async fn add_sprint(
    store: web::Data<dyn Store>,
    request: web::Json<NewSprint>,
) -> AppResult<HttpResponse> {
    let new = request.into_inner();
    new.validate()?;
    if store.get_project(new.project_id).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "Project {} does not exist",
            new.project_id
        )));
    }
    let sprint = store.create_sprint(new).await?;
    info!("Sprint {} created in project {}", sprint.id, sprint.project_id);
    Ok(HttpResponse::Created().json(sprint))
}

pub async fn update_sprint(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
    request: web::Json<SprintPatch>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let sprint = store
        .update_sprint(id, request.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Sprint", id))?;
    info!("Sprint {} updated", id);
    Ok(HttpResponse::Ok().json(sprint))
}

pub async fn delete_sprint(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if !store.delete_sprint(id).await? {
        return Err(AppError::not_found("Sprint", id));
    }
    info!("Sprint {} deleted", id);
    Ok(HttpResponse::Ok().json(DeleteSprintResponse {
        success: true,
        message: "Sprint deleted successfully".into(),
    }))
}

pub async fn get_sprint_tasks(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let sprint = store
        .get_sprint(id)
        .await?
        .ok_or_else(|| AppError::not_found("Sprint", id))?;
    let tasks = store
        .list_tasks(TaskFilter {
            project_id: Some(sprint.project_id),
            sprint_id: Some(sprint.id),
            ..Default::default()
        })
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}
