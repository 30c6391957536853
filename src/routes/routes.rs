use actix_web::dev::Service;
use actix_web::{web, HttpResponse};
use log::info;

use crate::error::AppError;
use super::auth::bearer_token;
use super::projects::projects_handlers;
use super::sprints::sprints_handlers;
use super::todolist::todolist_handlers;
use super::users::users_handlers;

pub fn root_configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(|| async { HttpResponse::Ok().body("Hello, this is the to-do backend.") }));
}

/// `/api/**`, behind the bearer-token gate.
pub fn api_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap_fn(|req, srv| {
                let authorized = bearer_token(req.headers()).is_some();
                let call = if authorized { Ok(srv.call(req)) } else { Err(req) };
                async move {
                    match call {
                        Ok(call) => call.await,
                        Err(req) => {
                            info!("Rejected {} without bearer token", req.path());
                            Ok(req.error_response(AppError::Unauthorized))
                        }
                    }
                }
            })
            .configure(projects_configure)
            .configure(users_configure),
    );
}

fn projects_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/projects")
            .route("", web::get().to(projects_handlers::list_projects))
            .route("", web::post().to(projects_handlers::add_project))
            .route("/{id}", web::get().to(projects_handlers::get_project))
            .route("/{id}", web::put().to(projects_handlers::update_project))
            .route("/{id}", web::delete().to(projects_handlers::delete_project))
            .route("/{id}/tasks", web::get().to(projects_handlers::get_project_tasks)),
    );
}

fn users_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/{project}/users")
            .route("", web::get().to(users_handlers::list_users))
            .route("", web::post().to(users_handlers::add_user))
            .route("/{id}", web::get().to(users_handlers::get_user))
            .route("/{id}", web::put().to(users_handlers::update_user))
            .route("/{id}", web::delete().to(users_handlers::delete_user))
            .route("/{id}/tasks", web::get().to(users_handlers::get_user_tasks)),
    );
}

pub fn sprints_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sprints")
            .route("", web::get().to(sprints_handlers::list_sprints))
            .route("", web::post().to(sprints_handlers::add_sprint))
            .route("/{id}", web::get().to(sprints_handlers::get_sprint))
            .route("/{id}", web::put().to(sprints_handlers::update_sprint))
            .route("/{id}", web::delete().to(sprints_handlers::delete_sprint))
            .route("/{id}/tasks", web::get().to(sprints_handlers::get_sprint_tasks)),
    );
}

pub fn todolist_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/todolist")
            .route("", web::get().to(todolist_handlers::list_tasks))
            .route("", web::post().to(todolist_handlers::add_task))
            .route("/{id}", web::get().to(todolist_handlers::get_task))
            .route("/{id}", web::put().to(todolist_handlers::update_task))
            .route("/{id}", web::delete().to(todolist_handlers::delete_task)),
    );
}

/// Malformed bodies and query strings answer with the same JSON error shape
/// as the handlers.
pub fn extractors_configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| {
        info!("Rejected body for {}: {}", req.path(), err);
        AppError::BadRequest(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, req| {
        info!("Rejected query for {}: {}", req.path(), err);
        AppError::BadRequest(err.to_string()).into()
    }));
}

/// Every route the backend serves.
pub fn configure(cfg: &mut web::ServiceConfig) {
    extractors_configure(cfg);
    root_configure(cfg);
    api_configure(cfg);
    sprints_configure(cfg);
    todolist_configure(cfg);
}
