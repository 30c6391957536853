pub mod auth;
pub mod routes;

pub mod projects;
pub mod sprints;
pub mod todolist;
pub mod users;
