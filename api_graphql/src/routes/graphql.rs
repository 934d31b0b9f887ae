use actix_web::{Responder, web};
use common::{
    error::{AppError, Res},
    graphql::{GraphQLRequest, GraphQLResponse, Operation},
    http::Success,
    session::{RequestContext, Session},
};
use db::store::Store;
use log::debug;
use serde_json::{Map, Value};

use crate::{normalizer::normalize, operations, state::AppState};

/// GraphQL-over-HTTP entry point.
///
/// # Arguments
///
/// * `state` - Shared store, capabilities and configuration.
/// * `session` - Session attached by the resolver middleware, if any.
/// * `request` - The `{operationName, query, variables}` envelope.
///
/// # Returns
///
/// Always HTTP 200 with `{data, errors}`; operation failures are reported
/// in `errors`.
pub async fn post_graphql<S: Store>(
    state: web::Data<AppState<S>>,
    session: Option<web::ReqData<Session>>,
    request: web::Json<GraphQLRequest>,
) -> Res<impl Responder> {
    let ctx = RequestContext::new(session.map(|s| s.into_inner()));
    let request = request.into_inner();
    let name = request.operation_name.unwrap_or_default();

    let Some(operation) = Operation::from_name(&name) else {
        debug!("Unknown operation {:?}", name);
        let err = AppError::BadRequest(format!("unknown operation {:?}", name));
        return Success::ok(failure(&err, &name));
    };

    let root = operation.root_field();
    let response = match operations::execute(&state, &ctx, operation, &request.variables).await {
        Ok(value) => {
            let mut data = Map::new();
            data.insert(root.to_string(), value);
            GraphQLResponse {
                data: Some(Value::Object(data)),
                errors: Vec::new(),
            }
        }
        Err(err) => failure(&err, root),
    };

    Success::ok(response)
}

fn failure(err: &AppError, root_field: &str) -> GraphQLResponse {
    GraphQLResponse {
        data: None,
        errors: vec![normalize(err, root_field)],
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, HttpMessage, dev::Service, http::StatusCode, test};
    use common::{
        env_config::{AppUrls, Environment, InviteConfig},
        identity::{IdentityClaims, MockIdentityAdmin},
        jwt::InviteTokenCodec,
        mail::MockMailer,
    };
    use db::memory::MemoryStore;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::mount_graphql;

    fn state(store: MemoryStore, mailer: MockMailer, identity: MockIdentityAdmin) -> AppState<MemoryStore> {
        AppState {
            store,
            mailer: Arc::new(mailer),
            identity: Arc::new(identity),
            invites: InviteTokenCodec::new(&InviteConfig {
                secret: "invite-secret".to_string(),
                expiration_hours: 24,
            }),
            sender_name: "Rively".to_string(),
            app_urls: AppUrls {
                environment: Environment::Local,
                local_url: "http://localhost:3000".to_string(),
                hosted_url: "https://app.rively.io".to_string(),
            },
        }
    }

    fn session() -> Session {
        Session {
            subject_id: "user_2zH".to_string(),
            user_uid: Uuid::new_v4(),
            customer_uid: Uuid::new_v4(),
            role: "owner".to_string(),
            user_name: String::new(),
            claims: IdentityClaims {
                subject: "user_2zH".to_string(),
                custom: Map::new(),
            },
        }
    }

    async fn call(
        state: AppState<MemoryStore>,
        session: Option<Session>,
        body: Value,
    ) -> GraphQLResponse {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap_fn(move |req, srv| {
                    if let Some(session) = session.clone() {
                        req.extensions_mut().insert(session);
                    }
                    srv.call(req)
                })
                .service(mount_graphql::<MemoryStore>()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/graphql")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        test::read_body_json(resp).await
    }

    #[actix_web::test]
    async fn signup_answers_under_its_root_field() {
        let mut mailer = MockMailer::new();
        mailer.expect_send_mail().times(1).returning(|_, _, _| Ok(()));
        let mut identity = MockIdentityAdmin::new();
        identity
            .expect_create_user()
            .returning(|_, _| Ok("user_2zH".to_string()));

        let response = call(
            state(MemoryStore::new(), mailer, identity),
            None,
            json!({
                "operationName": "Signup",
                "query": "mutation Signup($input: SignupInput!) { signup(input: $input) { userId } }",
                "variables": { "input": { "email": "jane@acme.io", "password": "hunter22" } }
            }),
        )
        .await;

        assert!(response.errors.is_empty());
        let data = response.data.unwrap();
        assert_eq!(data["signup"]["clerkId"], json!("user_2zH"));
        assert!(data["signup"]["customerUID"].is_string());
    }

    #[actix_web::test]
    async fn tenant_query_without_session_reports_authentication_error() {
        let response = call(
            state(MemoryStore::new(), MockMailer::new(), MockIdentityAdmin::new()),
            None,
            json!({
                "operationName": "getCustomer",
                "query": "query getCustomer { getCustomer { email } }"
            }),
        )
        .await;

        assert_eq!(response.data, None);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].path, vec!["getCustomer".to_string()]);
        assert_eq!(
            response.errors[0].extensions["code"],
            json!("AUTHENTICATION_ERROR")
        );
    }

    #[actix_web::test]
    async fn session_reaches_the_operation() {
        let response = call(
            state(MemoryStore::new(), MockMailer::new(), MockIdentityAdmin::new()),
            Some(session()),
            json!({
                "operationName": "getDepartments",
                "query": "query getDepartments { getDepartments { name } }"
            }),
        )
        .await;

        assert!(response.errors.is_empty());
        let departments = response.data.unwrap()["getDepartments"].clone();
        assert_eq!(departments.as_array().map(Vec::len), Some(6));
    }

    #[actix_web::test]
    async fn unknown_operation_is_a_validation_error() {
        let response = call(
            state(MemoryStore::new(), MockMailer::new(), MockIdentityAdmin::new()),
            Some(session()),
            json!({ "operationName": "dropTables", "query": "mutation dropTables { x }" }),
        )
        .await;

        assert_eq!(
            response.errors[0].extensions["code"],
            json!("VALIDATION_ERROR")
        );
    }

    #[actix_web::test]
    async fn foreign_tracked_company_update_is_not_found() {
        let response = call(
            state(MemoryStore::new(), MockMailer::new(), MockIdentityAdmin::new()),
            Some(session()),
            json!({
                "operationName": "UpdateTrackedCompany",
                "query": "mutation UpdateTrackedCompany($input: UpdateTrackedCompanyInput!) { updateTrackedCompany(input: $input) { IsActive } }",
                "variables": { "input": { "trackedCompanyUID": Uuid::new_v4().to_string(), "isActive": false } }
            }),
        )
        .await;

        assert_eq!(response.errors[0].path, vec!["updateTrackedCompany".to_string()]);
        assert_eq!(response.errors[0].extensions["code"], json!("NOT_FOUND"));
    }

    #[actix_web::test]
    async fn company_updates_answer_with_an_empty_feed() {
        let response = call(
            state(MemoryStore::new(), MockMailer::new(), MockIdentityAdmin::new()),
            Some(session()),
            json!({
                "operationName": "GetCompanyUpdates",
                "query": "query GetCompanyUpdates { getCompanyUpdates { Title } }"
            }),
        )
        .await;

        assert!(response.errors.is_empty());
        assert_eq!(response.data.unwrap()["getCompanyUpdates"], json!([]));
    }

    #[actix_web::test]
    async fn invite_round_trip_through_the_endpoint() {
        let store = MemoryStore::new();
        let department_uid = store.snapshot().departments[1].department_uid;
        let session = session();
        let customer_uid = session.customer_uid;

        let issued = call(
            state(store.clone(), MockMailer::new(), MockIdentityAdmin::new()),
            Some(session),
            json!({
                "operationName": "inviteEmailRecipient",
                "query": "mutation inviteEmailRecipient($input: InviteInput!) { inviteEmailRecipient(input: $input) { inviteToken } }",
                "variables": { "input": { "departmentUID": department_uid.to_string() } }
            }),
        )
        .await;
        let token = issued.data.unwrap()["inviteEmailRecipient"]["inviteToken"].clone();

        let checked = call(
            state(store, MockMailer::new(), MockIdentityAdmin::new()),
            None,
            json!({
                "operationName": "validateInvite",
                "query": "query validateInvite($input: ValidateInviteInput!) { validateInvite(input: $input) { isValid } }",
                "variables": { "input": { "token": token } }
            }),
        )
        .await;

        let result = checked.data.unwrap()["validateInvite"].clone();
        assert_eq!(result["isValid"], json!(true));
        assert_eq!(result["customerUID"], json!(customer_uid.to_string()));
    }
}
