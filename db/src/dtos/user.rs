use uuid::Uuid;

pub struct UserCreateRequest {
    pub email: String,
    pub is_verified: bool,
    pub customer_uid: Option<Uuid>,
    pub clerk_id: Option<String>,
}
