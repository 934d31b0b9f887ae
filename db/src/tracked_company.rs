use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::tracked_company::{TrackedCompanyCreateRequest, TrackedCompanyUpdate},
    models::tracked_company::TrackedCompany,
};

pub async fn insert_tracked_company<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: TrackedCompanyCreateRequest,
) -> Res<TrackedCompany> {
    sqlx::query_as::<_, TrackedCompany>(
        r#"
        INSERT INTO tracked_companies (name, domain, type, interests, customer_uid)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(data.name)
    .bind(data.domain)
    .bind(data.company_type)
    .bind(data.interests)
    .bind(data.customer_uid)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn list_tracked_companies_by_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_uid: Uuid,
) -> Res<Vec<TrackedCompany>> {
    sqlx::query_as::<_, TrackedCompany>(
        "SELECT * FROM tracked_companies WHERE customer_uid = $1 ORDER BY created_at",
    )
    .bind(customer_uid)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

/// Applies the provided fields; returns `None` when the company does not
/// belong to the customer.
pub async fn update_tracked_company<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    tracked_company_uid: Uuid,
    customer_uid: Uuid,
    data: TrackedCompanyUpdate,
) -> Res<Option<TrackedCompany>> {
    sqlx::query_as::<_, TrackedCompany>(
        r#"
        UPDATE tracked_companies
        SET type = COALESCE($1, type),
            interests = COALESCE($2, interests),
            is_active = COALESCE($3, is_active)
        WHERE tracked_company_uid = $4 AND customer_uid = $5
        RETURNING *
        "#,
    )
    .bind(data.company_type)
    .bind(data.interests)
    .bind(data.is_active)
    .bind(tracked_company_uid)
    .bind(customer_uid)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn delete_tracked_company<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    tracked_company_uid: Uuid,
    customer_uid: Uuid,
) -> Res<bool> {
    let result = sqlx::query(
        "DELETE FROM tracked_companies WHERE tracked_company_uid = $1 AND customer_uid = $2",
    )
    .bind(tracked_company_uid)
    .bind(customer_uid)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
