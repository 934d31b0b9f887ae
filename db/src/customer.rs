use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::customer::{CustomerCreateRequest, VerificationSentUpdate},
    models::customer::Customer,
};

pub async fn get_customer_by_uid<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_uid: Uuid,
) -> Res<Option<Customer>> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE customer_uid = $1")
        .bind(customer_uid)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: CustomerCreateRequest,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (email, is_verified)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(data.email)
    .bind(data.is_verified)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_customer_owner<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: i32,
    owner_id: i32,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers SET owner_id = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_customer_verification_token<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_uid: Uuid,
    token: &str,
) -> Res<()> {
    let result = sqlx::query(
        r#"
        UPDATE customers SET verification_token = $2, updated_at = NOW()
        WHERE customer_uid = $1
        "#,
    )
    .bind(customer_uid)
    .bind(token)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("customer {}", customer_uid)));
    }
    Ok(())
}

pub async fn mark_verification_sent<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_uid: Uuid,
    data: VerificationSentUpdate,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers
        SET domain = $2, verification_token_sent_at = $3, updated_at = NOW()
        WHERE customer_uid = $1
        RETURNING *
        "#,
    )
    .bind(customer_uid)
    .bind(data.domain)
    .bind(data.sent_at)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_customer_domain<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_uid: Uuid,
    domain: &str,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers SET domain = $2, updated_at = NOW()
        WHERE customer_uid = $1
        RETURNING *
        "#,
    )
    .bind(customer_uid)
    .bind(domain)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("customer {}", customer_uid)))
}

pub async fn set_customer_verified<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_uid: Uuid,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers SET is_verified = TRUE, updated_at = NOW()
        WHERE customer_uid = $1
        RETURNING *
        "#,
    )
    .bind(customer_uid)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}
