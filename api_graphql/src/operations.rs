//! Routing of GraphQL operations onto the service layer.
//!
//! The document itself is not executed; the operation name selects a
//! resolver and `variables.input` is decoded into its typed input.

use api_auth::{
    dtos::signup::{SignupRequest, VerifyCustomerRequest},
    services::auth,
};
use api_org::services::{
    company_update, customer, department, email_recipient, tracked_company, user,
};
use common::{
    error::{ErrorCode, FieldError, GraphQLError, Res},
    graphql::Operation,
    session::RequestContext,
};
use db::store::Store;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::state::AppState;

fn input<T: DeserializeOwned>(variables: &Map<String, Value>) -> Res<T> {
    let Some(raw) = variables.get("input") else {
        return Err(GraphQLError::inline(
            ErrorCode::ValidationError,
            vec![FieldError::new("input", "This field is required")],
        )
        .into());
    };

    serde_json::from_value(raw.clone()).map_err(|e| {
        GraphQLError::global(ErrorCode::ValidationError, format!("Invalid input: {}", e)).into()
    })
}

fn output<T: Serialize>(value: T) -> Res<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Runs one operation and returns its root field value.
pub async fn execute<S: Store>(
    state: &AppState<S>,
    ctx: &RequestContext,
    operation: Operation,
    variables: &Map<String, Value>,
) -> Res<Value> {
    let store = &state.store;
    let identity = state.identity.as_ref();

    match operation {
        Operation::Signup => {
            let request: SignupRequest = input(variables)?;
            output(auth::signup(store, identity, &state.verification_mailer(), request).await?)
        }
        Operation::VerifyCustomer => {
            let request: VerifyCustomerRequest = input(variables)?;
            output(auth::verify_customer(store, identity, &request.token).await?)
        }
        Operation::GetCustomer => output(customer::get_customer(store, ctx).await?),
        Operation::UpdateCustomerAndUser => output(
            customer::update_customer_and_user(store, identity, ctx, input(variables)?).await?,
        ),
        Operation::GetAccountUsers => output(user::get_account_users(store, ctx).await?),
        Operation::GetDepartments => output(department::get_departments(store, ctx).await?),
        Operation::InviteEmailRecipient => output(
            email_recipient::invite_email_recipient(store, &state.invites, ctx, input(variables)?)
                .await?,
        ),
        Operation::ValidateInvite => output(email_recipient::validate_invite(
            &state.invites,
            input(variables)?,
        )?),
        Operation::CreateEmailRecipient => output(
            email_recipient::create_email_recipient(store, ctx, input(variables)?).await?,
        ),
        Operation::GetAllEmailRecipients => {
            output(email_recipient::get_all_email_recipients(store, ctx).await?)
        }
        Operation::GetEmailRecipientsByDepartment => output(
            email_recipient::get_email_recipients_by_department(store, ctx, input(variables)?)
                .await?,
        ),
        Operation::UpdateEmailRecipient => output(
            email_recipient::update_email_recipient(store, ctx, input(variables)?).await?,
        ),
        Operation::DeleteEmailRecipient => output(
            email_recipient::delete_email_recipient(store, ctx, input(variables)?).await?,
        ),
        Operation::CreateTrackedCompany => output(
            tracked_company::create_tracked_companies(store, ctx, input(variables)?).await?,
        ),
        Operation::GetTrackedCompanies => {
            output(tracked_company::get_tracked_companies(store, ctx).await?)
        }
        Operation::UpdateTrackedCompany => output(
            tracked_company::update_tracked_company(store, ctx, input(variables)?).await?,
        ),
        Operation::DeleteTrackedCompany => output(
            tracked_company::delete_tracked_company(store, ctx, input(variables)?).await?,
        ),
        Operation::GetCompanyUpdates => {
            output(company_update::get_company_updates(store, ctx).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_a_field_error() {
        let err = input::<SignupRequest>(&Map::new()).unwrap_err();
        let shape = err.as_graphql_error().unwrap();
        assert_eq!(shape.fields, vec![FieldError::new("input", "This field is required")]);
    }
}
