use serde::Serialize;

#[derive(Serialize)]
pub struct DeleteTaskResponse {
    pub success: bool,
    pub message: String,
}
