use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i32,
    pub customer_uid: Uuid,
    pub email: String,
    pub domain: Option<String>,
    pub is_verified: bool,
    pub owner_id: Option<i32>,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    pub verification_token_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
