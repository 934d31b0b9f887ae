use chrono::{DateTime, Utc};
use db::models::tracked_company::TrackedCompany;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct TrackedCompanyInput {
    pub name: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub company_type: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrackedCompanyRequest {
    #[serde(rename = "trackedCompanyUID")]
    pub tracked_company_uid: String,
    #[serde(rename = "type")]
    pub company_type: Option<String>,
    pub interests: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteTrackedCompanyRequest {
    #[serde(rename = "trackedCompanyUID")]
    pub tracked_company_uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedCompanyResponse {
    #[serde(rename = "trackedCompanyUID")]
    pub tracked_company_uid: Uuid,
    pub name: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub company_type: String,
    pub interests: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TrackedCompany> for TrackedCompanyResponse {
    fn from(company: TrackedCompany) -> Self {
        TrackedCompanyResponse {
            tracked_company_uid: company.tracked_company_uid,
            name: company.name,
            domain: company.domain,
            company_type: company.company_type,
            interests: company.interests,
            is_active: company.is_active,
            created_at: company.created_at,
        }
    }
}
