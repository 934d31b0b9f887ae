use db::models::user::User;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUserResponse {
    #[serde(rename = "userUID")]
    pub user_uid: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub is_verified: bool,
}

impl From<User> for AccountUserResponse {
    fn from(user: User) -> Self {
        AccountUserResponse {
            user_uid: user.user_uid,
            email: user.email,
            name: user.name,
            role: user.role,
            is_verified: user.is_verified,
        }
    }
}
