use actix_web::{web, HttpResponse};
use log::info;

use crate::error::{AppError, AppResult};
use crate::models::{NewUser, Role, TaskFilter, User, UserPatch};
use crate::store::Store;
use super::users_models::{DeleteUserResponse, UserListQuery};

/// Users of other projects are reported as missing.
async fn user_in_project(store: &dyn Store, project_id: i64, id: i64) -> AppResult<User> {
    store
        .get_user(id)
        .await?
        .filter(|user| user.project_id == project_id)
        .ok_or_else(|| AppError::not_found("User", id))
}

async fn check_telegram_id_free(
    store: &dyn Store,
    telegram_id: Option<i64>,
    user_id: Option<i64>,
) -> AppResult<()> {
    let Some(telegram_id) = telegram_id else {
        return Ok(());
    };
    match store.find_user_by_telegram_id(telegram_id).await? {
        Some(other) if Some(other.id) != user_id => Err(AppError::BadRequest(format!(
            "Telegram id {} is already registered",
            telegram_id
        ))),
        _ => Ok(()),
    }
}

pub async fn list_users(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
    query: web::Query<UserListQuery>,
) -> AppResult<HttpResponse> {
    let project_id = path.into_inner();
    if store.get_project(project_id).await?.is_none() {
        return Err(AppError::not_found("Project", project_id));
    }
    let role = match query.role.as_deref() {
        Some(role) => Some(role.parse::<Role>()?),
        None => None,
    };
    let users = store
        .list_users(project_id, role.as_ref().map(Role::as_str))
        .await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn get_user(
    store: web::Data<dyn Store>,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (project_id, id) = path.into_inner();
    let user = user_in_project(store.get_ref(), project_id, id).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn add_user(
    store: web::Data<dyn Store>,
    path: web::Path<i64>,
    request: web::Json<NewUser>,
) -> AppResult<HttpResponse> {
    let project_id = path.into_inner();
    let mut new = request.into_inner();
    if new.project_id != project_id {
        return Err(AppError::NotFound(format!(
            "User belongs to project {}, not {}",
            new.project_id, project_id
        )));
    }
    if store.get_project(project_id).await?.is_none() {
        return Err(AppError::not_found("Project", project_id));
    }
    new.validate()?;
    new.role = new.role.parse::<Role>()?.as_str().to_string();
    check_telegram_id_free(store.get_ref(), new.telegram_id, None).await?;

    let user = store.create_user(new).await?;
    info!("User {} created in project {} as {}", user.id, project_id, user.role);
    Ok(HttpResponse::Created().json(user))
}

pub async fn update_user(
    store: web::Data<dyn Store>,
    path: web::Path<(i64, i64)>,
    request: web::Json<UserPatch>,
) -> AppResult<HttpResponse> {
    let (project_id, id) = path.into_inner();
    let patch = request.into_inner();
    user_in_project(store.get_ref(), project_id, id).await?;
    if patch.project_id.is_some_and(|p| p != project_id) {
        return Err(AppError::NotFound(format!(
            "User {} cannot be moved out of project {}",
            id, project_id
        )));
    }
    check_telegram_id_free(store.get_ref(), patch.telegram_id, Some(id)).await?;

    let user = store
        .update_user(id, patch)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    info!("User {} updated", id);
    Ok(HttpResponse::Ok().json(user))
}

pub async fn delete_user(
    store: web::Data<dyn Store>,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (project_id, id) = path.into_inner();
    user_in_project(store.get_ref(), project_id, id).await?;
    if !store.delete_user(id).await? {
        return Err(AppError::not_found("User", id));
    }
    info!("User {} deleted from project {}", id, project_id);
    Ok(HttpResponse::Ok().json(DeleteUserResponse {
        success: true,
        message: "User deleted successfully".into(),
    }))
}

pub async fn get_user_tasks(
    store: web::Data<dyn Store>,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (project_id, id) = path.into_inner();
    user_in_project(store.get_ref(), project_id, id).await?;
    let tasks = store
        .list_tasks(TaskFilter {
            project_id: Some(project_id),
            assigned_to: Some(id),
            ..Default::default()
        })
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}
