use db::models::department::Department;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentResponse {
    #[serde(rename = "departmentUID")]
    pub department_uid: Uuid,
    pub name: String,
}

impl From<Department> for DepartmentResponse {
    fn from(department: Department) -> Self {
        DepartmentResponse {
            department_uid: department.department_uid,
            name: department.name,
        }
    }
}
