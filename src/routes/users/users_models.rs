use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
}
