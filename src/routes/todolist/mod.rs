pub mod todolist_handlers;
pub mod todolist_models;
