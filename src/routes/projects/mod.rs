pub mod projects_handlers;
pub mod projects_models;
