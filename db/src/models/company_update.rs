use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A news item about a tracked company. `domain` is read from the owning
/// tracked company, not stored on the row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct CompanyUpdate {
    pub id: i32,
    pub company_update_uid: Uuid,
    pub tracked_company_uid: Uuid,
    pub title: String,
    pub description: String,
    pub update_category: String,
    pub update_type: String,
    pub source_type: String,
    pub source_url: String,
    pub action_point: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub domain: String,
}
