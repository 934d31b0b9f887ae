use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct TrackedCompany {
    pub id: i32,
    pub tracked_company_uid: Uuid,
    pub name: String,
    pub domain: String,
    #[sqlx(rename = "type")]
    pub company_type: String,
    pub interests: Vec<String>,
    pub is_active: bool,
    pub customer_uid: Uuid,
    pub created_at: DateTime<Utc>,
}
