use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    conflict_on_unique,
    dtos::email_recipient::{EmailRecipientCreateRequest, EmailRecipientUpdate},
    models::email_recipient::EmailRecipient,
};

pub async fn insert_email_recipient<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: EmailRecipientCreateRequest,
) -> Res<EmailRecipient> {
    let email = data.email.clone();
    sqlx::query_as::<_, EmailRecipient>(
        r#"
        INSERT INTO email_recipients (name, email, department_uid, customer_uid)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(data.name)
    .bind(data.email)
    .bind(data.department_uid)
    .bind(data.customer_uid)
    .fetch_one(executor)
    .await
    .map_err(|err| conflict_on_unique(err, || format!("email recipient {}", email)))
}

pub async fn get_email_recipient_by_email<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email: &str,
) -> Res<Option<EmailRecipient>> {
    sqlx::query_as::<_, EmailRecipient>("SELECT * FROM email_recipients WHERE email = $1")
        .bind(email)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_email_recipient_by_uid<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email_recipient_uid: Uuid,
) -> Res<Option<EmailRecipient>> {
    sqlx::query_as::<_, EmailRecipient>(
        "SELECT * FROM email_recipients WHERE email_recipient_uid = $1",
    )
    .bind(email_recipient_uid)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn list_email_recipients_by_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_uid: Uuid,
) -> Res<Vec<EmailRecipient>> {
    sqlx::query_as::<_, EmailRecipient>(
        "SELECT * FROM email_recipients WHERE customer_uid = $1 ORDER BY created_at",
    )
    .bind(customer_uid)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn list_email_recipients_by_department<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    department_uid: Uuid,
    customer_uid: Uuid,
) -> Res<Vec<EmailRecipient>> {
    sqlx::query_as::<_, EmailRecipient>(
        r#"
        SELECT * FROM email_recipients
        WHERE department_uid = $1 AND customer_uid = $2
        ORDER BY created_at
        "#,
    )
    .bind(department_uid)
    .bind(customer_uid)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

/// Returns `None` when the recipient does not belong to the customer.
pub async fn update_email_recipient<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email_recipient_uid: Uuid,
    customer_uid: Uuid,
    data: EmailRecipientUpdate,
) -> Res<Option<EmailRecipient>> {
    let email = data.email.clone();
    sqlx::query_as::<_, EmailRecipient>(
        r#"
        UPDATE email_recipients
        SET name = $1, email = $2, is_active = $3, department_uid = $4
        WHERE email_recipient_uid = $5 AND customer_uid = $6
        RETURNING *
        "#,
    )
    .bind(data.name)
    .bind(data.email)
    .bind(data.is_active)
    .bind(data.department_uid)
    .bind(email_recipient_uid)
    .bind(customer_uid)
    .fetch_optional(executor)
    .await
    .map_err(|err| conflict_on_unique(err, || format!("email recipient {}", email)))
}

/// Returns whether a row was deleted.
pub async fn delete_email_recipient<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email_recipient_uid: Uuid,
    customer_uid: Uuid,
) -> Res<bool> {
    let result = sqlx::query(
        "DELETE FROM email_recipients WHERE email_recipient_uid = $1 AND customer_uid = $2",
    )
    .bind(email_recipient_uid)
    .bind(customer_uid)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
