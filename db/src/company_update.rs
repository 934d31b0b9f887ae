use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::company_update::CompanyUpdate;

/// Updates for every tracked company of the customer, newest first.
pub async fn list_company_updates_by_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_uid: Uuid,
) -> Res<Vec<CompanyUpdate>> {
    sqlx::query_as::<_, CompanyUpdate>(
        r#"
        SELECT cu.*, tc.domain
        FROM company_updates cu
        JOIN tracked_companies tc ON tc.tracked_company_uid = cu.tracked_company_uid
        WHERE tc.customer_uid = $1
        ORDER BY cu.posted_at DESC
        "#,
    )
    .bind(customer_uid)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}
