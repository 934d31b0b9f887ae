use chrono::{DateTime, Utc};
use db::models::email_recipient::EmailRecipient;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct InviteEmailRecipientRequest {
    #[serde(rename = "departmentUID")]
    pub department_uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub invite_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateInviteRequest {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteValidationResponse {
    #[serde(rename = "departmentUID")]
    pub department_uid: Uuid,
    #[serde(rename = "customerUID")]
    pub customer_uid: Uuid,
    pub is_valid: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmailRecipientRequest {
    pub name: String,
    pub email: String,
    #[serde(rename = "departmentUID")]
    pub department_uid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailRecipientsByDepartmentRequest {
    #[serde(rename = "departmentUID")]
    pub department_uid: String,
}

/// Omitted fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmailRecipientRequest {
    #[serde(rename = "emailRecipientUID")]
    pub email_recipient_uid: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    #[serde(rename = "departmentUID")]
    pub department_uid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteEmailRecipientRequest {
    #[serde(rename = "emailRecipientUID")]
    pub email_recipient_uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecipientResponse {
    #[serde(rename = "emailRecipientUID")]
    pub email_recipient_uid: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    #[serde(rename = "departmentUID")]
    pub department_uid: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<EmailRecipient> for EmailRecipientResponse {
    fn from(recipient: EmailRecipient) -> Self {
        EmailRecipientResponse {
            email_recipient_uid: recipient.email_recipient_uid,
            name: recipient.name,
            email: recipient.email,
            is_active: recipient.is_active,
            department_uid: recipient.department_uid,
            created_at: recipient.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}
