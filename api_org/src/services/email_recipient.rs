//! Invitations and the notification recipients of a customer.

use chrono::{DateTime, Utc};
use common::{
    error::{AppError, ErrorCode, FieldError, GraphQLError, Res},
    jwt::InviteTokenCodec,
    misc::parse_uid,
    session::RequestContext,
};
use db::{
    dtos::email_recipient::{EmailRecipientCreateRequest, EmailRecipientUpdate},
    store::Store,
};
use log::info;
use uuid::Uuid;

use crate::dtos::email_recipient::{
    CreateEmailRecipientRequest, DeleteEmailRecipientRequest, DeleteResponse,
    EmailRecipientResponse, EmailRecipientsByDepartmentRequest, InviteEmailRecipientRequest,
    InviteResponse, InviteValidationResponse, UpdateEmailRecipientRequest,
    ValidateInviteRequest,
};

async fn require_department<S: Store>(store: &S, department_uid: Uuid) -> Res<()> {
    let mut repo = store.clone();
    match repo.get_department_by_uid(department_uid).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("department {}", department_uid))),
    }
}

/// Issues an invitation into one of the session customer's departments.
pub async fn invite_email_recipient<S: Store>(
    store: &S,
    codec: &InviteTokenCodec,
    ctx: &RequestContext,
    input: InviteEmailRecipientRequest,
) -> Res<InviteResponse> {
    let customer_uid = ctx.current_customer_uid()?;
    let department_uid = parse_uid("departmentUID", &input.department_uid)?;
    require_department(store, department_uid).await?;

    let invite_token = codec.issue(department_uid, customer_uid)?;
    info!(
        "Invite issued for department {} of customer {}",
        department_uid, customer_uid
    );

    Ok(InviteResponse { invite_token })
}

/// Decodes an invitation. Answered from the token alone, no session needed.
pub fn validate_invite(
    codec: &InviteTokenCodec,
    input: ValidateInviteRequest,
) -> Res<InviteValidationResponse> {
    validate_invite_at(codec, input, Utc::now())
}

pub fn validate_invite_at(
    codec: &InviteTokenCodec,
    input: ValidateInviteRequest,
    now: DateTime<Utc>,
) -> Res<InviteValidationResponse> {
    let claims = codec.validate_at(&input.token, now)?;

    Ok(InviteValidationResponse {
        department_uid: claims.department_uid,
        customer_uid: claims.customer_uid,
        is_valid: claims.is_usable_at(now),
        expires_at: claims.expires_at,
        created_at: claims.created_at,
    })
}

fn validate_recipient(name: Option<&str>, email: Option<&str>) -> Res<()> {
    let mut fields = Vec::new();
    if name.is_some_and(|name| name.trim().is_empty()) {
        fields.push(FieldError::new("name", "This field is required"));
    }
    if email.is_some_and(|email| email.trim().is_empty() || !email.contains('@')) {
        fields.push(FieldError::new("email", "Must be a valid email address"));
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(GraphQLError::inline(ErrorCode::ValidationError, fields).into())
    }
}

pub async fn create_email_recipient<S: Store>(
    store: &S,
    ctx: &RequestContext,
    input: CreateEmailRecipientRequest,
) -> Res<EmailRecipientResponse> {
    let customer_uid = ctx.current_customer_uid()?;
    validate_recipient(Some(input.name.as_str()), Some(input.email.as_str()))?;
    let department_uid = parse_uid("departmentUID", &input.department_uid)?;
    require_department(store, department_uid).await?;

    let mut repo = store.clone();
    let email = input.email.trim().to_lowercase();
    if repo.get_email_recipient_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "email recipient {} already exists",
            email
        )));
    }

    let recipient = repo
        .create_email_recipient(EmailRecipientCreateRequest {
            name: input.name.trim().to_string(),
            email,
            department_uid,
            customer_uid,
        })
        .await?;

    Ok(recipient.into())
}

pub async fn get_all_email_recipients<S: Store>(
    store: &S,
    ctx: &RequestContext,
) -> Res<Vec<EmailRecipientResponse>> {
    let customer_uid = ctx.current_customer_uid()?;
    let mut repo = store.clone();
    let recipients = repo.list_email_recipients_by_customer(customer_uid).await?;

    Ok(recipients.into_iter().map(EmailRecipientResponse::from).collect())
}

/// Recipients of the session customer in one department.
pub async fn get_email_recipients_by_department<S: Store>(
    store: &S,
    ctx: &RequestContext,
    input: EmailRecipientsByDepartmentRequest,
) -> Res<Vec<EmailRecipientResponse>> {
    let customer_uid = ctx.current_customer_uid()?;
    let department_uid = parse_uid("departmentUID", &input.department_uid)?;
    require_department(store, department_uid).await?;

    let mut repo = store.clone();
    let recipients = repo
        .list_email_recipients_by_department(department_uid, customer_uid)
        .await?;

    Ok(recipients.into_iter().map(EmailRecipientResponse::from).collect())
}

/// Changes the provided fields of a recipient of the session customer.
/// Recipients of other customers are reported as missing.
pub async fn update_email_recipient<S: Store>(
    store: &S,
    ctx: &RequestContext,
    input: UpdateEmailRecipientRequest,
) -> Res<EmailRecipientResponse> {
    let customer_uid = ctx.current_customer_uid()?;
    let recipient_uid = parse_uid("emailRecipientUID", &input.email_recipient_uid)?;
    validate_recipient(input.name.as_deref(), input.email.as_deref())?;

    let mut repo = store.clone();
    let current = repo
        .get_email_recipient_by_uid(recipient_uid)
        .await?
        .filter(|r| r.customer_uid == customer_uid)
        .ok_or_else(|| AppError::NotFound(format!("email recipient {}", recipient_uid)))?;

    let department_uid = match input.department_uid.as_deref() {
        Some(raw) => {
            let department_uid = parse_uid("departmentUID", raw)?;
            require_department(store, department_uid).await?;
            department_uid
        }
        None => current.department_uid,
    };

    let email = match input.email {
        Some(email) => email.trim().to_lowercase(),
        None => current.email.clone(),
    };
    if email != current.email && repo.get_email_recipient_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "email recipient {} already exists",
            email
        )));
    }

    let updated = repo
        .update_email_recipient(
            recipient_uid,
            customer_uid,
            EmailRecipientUpdate {
                name: input
                    .name
                    .map(|name| name.trim().to_string())
                    .unwrap_or(current.name),
                email,
                is_active: input.is_active.unwrap_or(current.is_active),
                department_uid,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("email recipient {}", recipient_uid)))?;
    info!("Email recipient {} updated", recipient_uid);

    Ok(updated.into())
}

/// Deletes a recipient of the session customer. Recipients of other
/// customers are reported as missing.
pub async fn delete_email_recipient<S: Store>(
    store: &S,
    ctx: &RequestContext,
    input: DeleteEmailRecipientRequest,
) -> Res<DeleteResponse> {
    let customer_uid = ctx.current_customer_uid()?;
    let recipient_uid = parse_uid("emailRecipientUID", &input.email_recipient_uid)?;

    let mut repo = store.clone();
    if !repo.delete_email_recipient(recipient_uid, customer_uid).await? {
        return Err(AppError::NotFound(format!("email recipient {}", recipient_uid)));
    }

    Ok(DeleteResponse { success: true })
}
