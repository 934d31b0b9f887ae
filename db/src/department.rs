use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::department::Department;

pub async fn list_departments<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
) -> Res<Vec<Department>> {
    sqlx::query_as::<_, Department>("SELECT * FROM departments ORDER BY id")
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_department_by_uid<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    department_uid: Uuid,
) -> Res<Option<Department>> {
    sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE department_uid = $1")
        .bind(department_uid)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}
