use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct EmailRecipient {
    pub id: i32,
    pub email_recipient_uid: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub department_uid: Uuid,
    pub customer_uid: Uuid,
    pub created_at: DateTime<Utc>,
}
