pub mod sprints_handlers;
pub mod sprints_models;
