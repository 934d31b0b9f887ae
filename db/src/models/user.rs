use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub user_uid: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub is_verified: bool,
    pub customer_uid: Option<Uuid>,
    pub clerk_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
