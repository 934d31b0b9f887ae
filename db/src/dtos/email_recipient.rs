use uuid::Uuid;

pub struct EmailRecipientCreateRequest {
    pub name: String,
    pub email: String,
    pub department_uid: Uuid,
    pub customer_uid: Uuid,
}

/// Full replacement values; callers merge partial input beforehand.
pub struct EmailRecipientUpdate {
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub department_uid: Uuid,
}
