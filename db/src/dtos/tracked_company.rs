use uuid::Uuid;

pub struct TrackedCompanyCreateRequest {
    pub name: String,
    pub domain: String,
    pub company_type: String,
    pub interests: Vec<String>,
    pub customer_uid: Uuid,
}

/// `None` keeps the stored value.
#[derive(Default)]
pub struct TrackedCompanyUpdate {
    pub company_type: Option<String>,
    pub interests: Option<Vec<String>>,
    pub is_active: Option<bool>,
}
