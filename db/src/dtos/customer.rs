use chrono::{DateTime, Utc};

pub struct CustomerCreateRequest {
    pub email: String,
    pub is_verified: bool,
}

pub struct VerificationSentUpdate {
    pub domain: String,
    pub sent_at: DateTime<Utc>,
}
