use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Department {
    pub id: i32,
    pub department_uid: Uuid,
    pub name: String,
}
