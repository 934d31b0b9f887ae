use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub user_id: Uuid,
    #[serde(rename = "customerUID")]
    pub customer_uid: Uuid,
    pub clerk_id: String,
}

/// Canonical view of a freshly created owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    #[serde(rename = "userUID")]
    pub user_uid: Uuid,
    pub email: String,
    pub is_verified: bool,
    #[serde(rename = "customerUID")]
    pub customer_uid: Option<Uuid>,
}

impl From<db::models::user::User> for UserResponse {
    fn from(user: db::models::user::User) -> Self {
        UserResponse {
            id: user.id,
            user_uid: user.user_uid,
            email: user.email,
            is_verified: user.is_verified,
            customer_uid: user.customer_uid,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCustomerRequest {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyCustomerResponse {
    pub success: bool,
    /// Identity provider sign-in token for the verified owner.
    pub token: Option<String>,
}
