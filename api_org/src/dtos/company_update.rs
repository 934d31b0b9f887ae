use chrono::{DateTime, Utc};
use db::models::company_update::CompanyUpdate;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUpdateResponse {
    #[serde(rename = "companyUpdateUID")]
    pub company_update_uid: Uuid,
    pub title: String,
    pub description: String,
    pub update_category: String,
    pub update_type: String,
    pub source_type: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    pub posted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub action_point: Option<String>,
    #[serde(rename = "trackedCompanyUID")]
    pub tracked_company_uid: Uuid,
    pub domain: String,
}

impl From<CompanyUpdate> for CompanyUpdateResponse {
    fn from(update: CompanyUpdate) -> Self {
        CompanyUpdateResponse {
            company_update_uid: update.company_update_uid,
            title: update.title,
            description: update.description,
            update_category: update.update_category,
            update_type: update.update_type,
            source_type: update.source_type,
            source_url: update.source_url,
            posted_at: update.posted_at,
            created_at: update.created_at,
            action_point: update.action_point,
            tracked_company_uid: update.tracked_company_uid,
            domain: update.domain,
        }
    }
}
