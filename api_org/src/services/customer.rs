use common::{
    error::{AppError, ErrorCode, FieldError, GraphQLError, Res},
    identity::IdentityAdmin,
    session::{RequestContext, Session},
};
use db::{
    dtos::email_recipient::EmailRecipientCreateRequest,
    models::customer::Customer,
    store::{Store, UnitOfWork},
};
use log::{debug, error, info};
use serde_json::json;

use crate::dtos::customer::{CustomerResponse, UpdateCustomerAndUserRequest};

/// Department that receives the owner's own notifications.
pub const LEADERSHIP_DEPARTMENT: &str = "Leadership";

/// Returns the customer of the current session.
pub async fn get_customer<S: Store>(store: &S, ctx: &RequestContext) -> Res<CustomerResponse> {
    let customer_uid = ctx.current_customer_uid()?;
    let mut repo = store.clone();

    repo.get_customer_by_uid(customer_uid)
        .await?
        .map(CustomerResponse::from)
        .ok_or_else(|| AppError::NotFound(format!("customer {}", customer_uid)))
}

fn validate_onboarding(input: &UpdateCustomerAndUserRequest) -> Res<()> {
    let fields: Vec<FieldError> = [
        ("name", &input.name),
        ("role", &input.role),
        ("domain", &input.domain),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| FieldError::new(field, "This field is required"))
    .collect();

    if fields.is_empty() {
        Ok(())
    } else {
        Err(GraphQLError::inline(ErrorCode::ValidationError, fields).into())
    }
}

/// Completes onboarding for the session's user.
///
/// # Arguments
///
/// * `store` - Repositories and Unit-of-Work factory.
/// * `identity` - Identity provider, receives the new name and role.
/// * `ctx` - Request context carrying the session.
/// * `input` - Display name, role and company domain.
///
/// # Returns
///
/// The updated customer. Database writes are rolled back when the identity
/// provider cannot be updated.
pub async fn update_customer_and_user<S: Store>(
    store: &S,
    identity: &dyn IdentityAdmin,
    ctx: &RequestContext,
    input: UpdateCustomerAndUserRequest,
) -> Res<CustomerResponse> {
    let session = ctx.session()?;
    validate_onboarding(&input)?;

    let mut tx = store.begin().await?;
    match onboard_in(&mut tx, identity, session, &input).await {
        Ok(customer) => {
            tx.commit().await?;
            info!("Customer {} onboarded", customer.customer_uid);
            Ok(customer.into())
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!("Onboarding rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn onboard_in<T: UnitOfWork>(
    tx: &mut T,
    identity: &dyn IdentityAdmin,
    session: &Session,
    input: &UpdateCustomerAndUserRequest,
) -> Res<Customer> {
    let name = input.name.trim();
    let role = input.role.trim();

    let customer = tx
        .get_customer_by_uid(session.customer_uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {}", session.customer_uid)))?;

    let leadership = tx
        .list_departments()
        .await?
        .into_iter()
        .find(|d| d.name == LEADERSHIP_DEPARTMENT)
        .ok_or_else(|| AppError::NotFound(format!("{} department", LEADERSHIP_DEPARTMENT)))?;

    match tx.get_email_recipient_by_email(&customer.email).await? {
        Some(existing) if existing.customer_uid == customer.customer_uid => {
            debug!("{} is already a recipient", customer.email);
        }
        Some(_) => {
            return Err(AppError::Conflict(format!(
                "{} is registered by another customer",
                customer.email
            )));
        }
        None => {
            tx.create_email_recipient(EmailRecipientCreateRequest {
                name: name.to_string(),
                email: customer.email.clone(),
                department_uid: leadership.department_uid,
                customer_uid: customer.customer_uid,
            })
            .await?;
        }
    }

    let customer = tx
        .update_customer_domain(customer.customer_uid, input.domain.trim())
        .await?;
    tx.update_user_profile(session.user_uid, name, role).await?;

    identity
        .update_public_metadata(
            &session.subject_id,
            json!({ "userName": name, "role": role }),
        )
        .await?;

    Ok(customer)
}
