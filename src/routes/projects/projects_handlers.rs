use actix_web::{web, HttpResponse};
use log::info;

use crate::error::{AppError, AppResult};
use crate::models::{NewProject, ProjectPatch, TaskFilter};
use crate::store::Store;
use super::projects_models::DeleteProjectResponse;

pub async fn list_projects(store: web::Data<dyn Store>) -> AppResult<HttpResponse> {
    let projects = store.list_projects().await?;
    Ok(HttpResponse::Ok().json(projects))
}

pub async fn get_project(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let project = store
        .get_project(id)
        .await?
        .ok_or_else(|| AppError::not_found("Project", id))?;
    Ok(HttpResponse::Ok().json(project))
}

pub async fn add_project(
    store: web::Data<dyn Store>,
    request: web::Json<NewProject>,
) -> AppResult<HttpResponse> {
    let new = request.into_inner();
    new.validate()?;
    let project = store.create_project(new).await?;
    info!("Project {} created: {}", project.id, project.name);
    Ok(HttpResponse::Created().json(project))
}

pub async fn update_project(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
    request: web::Json<ProjectPatch>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let project = store
        .update_project(id, request.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Project", id))?;
    info!("Project {} updated", id);
    Ok(HttpResponse::Ok().json(project))
}

pub async fn delete_project(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if !store.delete_project(id).await? {
        return Err(AppError::not_found("Project", id));
    }
    info!("Project {} deleted", id);
    Ok(HttpResponse::Ok().json(DeleteProjectResponse {
        success: true,
        message: "Project deleted successfully".into(),
    }))
}

pub async fn get_project_tasks(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if store.get_project(id).await?.is_none() {
        return Err(AppError::not_found("Project", id));
    }
    let tasks = store
        .list_tasks(TaskFilter {
            project_id: Some(id),
            ..Default::default()
        })
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}
