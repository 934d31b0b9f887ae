use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{dtos::user::UserCreateRequest, models::user::User};

pub async fn get_user_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: i32,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_user_by_uid<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_uid: Uuid,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_uid = $1")
        .bind(user_uid)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: UserCreateRequest,
) -> Res<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, is_verified, customer_uid, clerk_id)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(data.email)
    .bind(data.is_verified)
    .bind(data.customer_uid)
    .bind(data.clerk_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_user_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: i32,
    customer_uid: Uuid,
) -> Res<User> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET customer_uid = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(customer_uid)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_user_profile<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_uid: Uuid,
    name: &str,
    role: &str,
) -> Res<User> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET name = $2, role = $3, updated_at = NOW()
        WHERE user_uid = $1
        RETURNING *
        "#,
    )
    .bind(user_uid)
    .bind(name)
    .bind(role)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("user {}", user_uid)))
}

pub async fn list_users_by_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_uid: Uuid,
) -> Res<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE customer_uid = $1 ORDER BY id")
        .bind(customer_uid)
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}
