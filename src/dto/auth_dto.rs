use crate::models::session::SessionView;
use crate::services::session_service::SessionFlag;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GuestRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub session: SessionView,
    /// Shown to guests: their code stops working after this many hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_code_ttl_hours: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
    pub cancelled_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetFlagRequest {
    pub flag: SessionFlag,
}
