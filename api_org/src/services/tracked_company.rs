use common::{
    error::{AppError, ErrorCode, FieldError, GraphQLError, Res},
    misc::parse_uid,
    session::RequestContext,
};
use db::{
    dtos::tracked_company::{TrackedCompanyCreateRequest, TrackedCompanyUpdate},
    models::tracked_company::TrackedCompany,
    store::{Store, UnitOfWork},
};
use log::{error, info};
use uuid::Uuid;

use crate::dtos::{
    email_recipient::DeleteResponse,
    tracked_company::{
        DeleteTrackedCompanyRequest, TrackedCompanyInput, TrackedCompanyResponse,
        UpdateTrackedCompanyRequest,
    },
};

fn validate_companies(inputs: &[TrackedCompanyInput]) -> Res<()> {
    if inputs.is_empty() {
        return Err(GraphQLError::inline(
            ErrorCode::ValidationError,
            vec![FieldError::new("input", "At least one company is required")],
        )
        .into());
    }

    let mut fields = Vec::new();
    for (i, input) in inputs.iter().enumerate() {
        if input.name.trim().is_empty() {
            fields.push(FieldError::new(format!("input[{}].name", i), "This field is required"));
        }
        if input.domain.trim().is_empty() {
            fields.push(FieldError::new(format!("input[{}].domain", i), "This field is required"));
        }
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(GraphQLError::inline(ErrorCode::ValidationError, fields).into())
    }
}

/// Adds a batch of companies to the session customer's watch list.
/// Either every company is stored or none is.
pub async fn create_tracked_companies<S: Store>(
    store: &S,
    ctx: &RequestContext,
    inputs: Vec<TrackedCompanyInput>,
) -> Res<Vec<TrackedCompanyResponse>> {
    let customer_uid = ctx.current_customer_uid()?;
    validate_companies(&inputs)?;

    let mut tx = store.begin().await?;
    match insert_all(&mut tx, customer_uid, inputs).await {
        Ok(companies) => {
            tx.commit().await?;
            info!(
                "{} tracked companies added for customer {}",
                companies.len(),
                customer_uid
            );
            Ok(companies.into_iter().map(TrackedCompanyResponse::from).collect())
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!("Tracked company rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn insert_all<T: UnitOfWork>(
    tx: &mut T,
    customer_uid: Uuid,
    inputs: Vec<TrackedCompanyInput>,
) -> Res<Vec<TrackedCompany>> {
    let mut companies = Vec::with_capacity(inputs.len());
    for input in inputs {
        let company = tx
            .create_tracked_company(TrackedCompanyCreateRequest {
                name: input.name.trim().to_string(),
                domain: input.domain.trim().to_lowercase(),
                company_type: input.company_type,
                interests: input.interests,
                customer_uid,
            })
            .await?;
        companies.push(company);
    }
    Ok(companies)
}

pub async fn get_tracked_companies<S: Store>(
    store: &S,
    ctx: &RequestContext,
) -> Res<Vec<TrackedCompanyResponse>> {
    let customer_uid = ctx.current_customer_uid()?;
    let mut repo = store.clone();
    let companies = repo.list_tracked_companies_by_customer(customer_uid).await?;

    Ok(companies.into_iter().map(TrackedCompanyResponse::from).collect())
}

/// Changes the type, interests or active flag of one of the session
/// customer's companies. Companies of other customers are reported as missing.
pub async fn update_tracked_company<S: Store>(
    store: &S,
    ctx: &RequestContext,
    input: UpdateTrackedCompanyRequest,
) -> Res<TrackedCompanyResponse> {
    let customer_uid = ctx.current_customer_uid()?;
    let company_uid = parse_uid("trackedCompanyUID", &input.tracked_company_uid)?;
    if input
        .company_type
        .as_deref()
        .is_some_and(|company_type| company_type.trim().is_empty())
    {
        return Err(GraphQLError::inline(
            ErrorCode::ValidationError,
            vec![FieldError::new("type", "This field is required")],
        )
        .into());
    }

    let mut repo = store.clone();
    let company = repo
        .update_tracked_company(
            company_uid,
            customer_uid,
            TrackedCompanyUpdate {
                company_type: input.company_type.map(|t| t.trim().to_string()),
                interests: input.interests,
                is_active: input.is_active,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tracked company {}", company_uid)))?;
    info!("Tracked company {} updated", company_uid);

    Ok(company.into())
}

pub async fn delete_tracked_company<S: Store>(
    store: &S,
    ctx: &RequestContext,
    input: DeleteTrackedCompanyRequest,
) -> Res<DeleteResponse> {
    let customer_uid = ctx.current_customer_uid()?;
    let company_uid = parse_uid("trackedCompanyUID", &input.tracked_company_uid)?;

    let mut repo = store.clone();
    if !repo.delete_tracked_company(company_uid, customer_uid).await? {
        return Err(AppError::NotFound(format!("tracked company {}", company_uid)));
    }

    Ok(DeleteResponse { success: true })
}
