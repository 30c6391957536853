use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct SprintListQuery {
    pub project_id: Option<i64>,
}

#[derive(Serialize)]
pub struct DeleteSprintResponse {
    pub success: bool,
    pub message: String,
}
