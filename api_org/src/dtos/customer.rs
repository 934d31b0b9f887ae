use chrono::{DateTime, Utc};
use db::models::customer::Customer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    #[serde(rename = "customerUID")]
    pub customer_uid: Uuid,
    pub email: String,
    pub domain: Option<String>,
    pub is_verified: bool,
    pub verification_token_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        CustomerResponse {
            customer_uid: customer.customer_uid,
            email: customer.email,
            domain: customer.domain,
            is_verified: customer.is_verified,
            verification_token_sent_at: customer.verification_token_sent_at,
            created_at: customer.created_at,
        }
    }
}

/// Onboarding details collected once the owner has verified their email.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCustomerAndUserRequest {
    pub name: String,
    pub role: String,
    pub domain: String,
}
