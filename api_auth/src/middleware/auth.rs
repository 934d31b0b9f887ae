use std::{future::Future, pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    Error, HttpMessage, HttpRequest, HttpResponse,
    body::BoxBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Method,
    web::{self, Bytes},
};
use common::{
    error::{AppError, Res},
    graphql::{GraphQLRequest, Operation, OperationKind},
    identity::{IdentityClaims, IdentityVerifier},
    session::Session,
};
use futures::{
    StreamExt,
    future::{Ready, ok},
};
use log::{debug, warn};
use uuid::Uuid;

/// Operations reachable without a bearer assertion, matched without regard
/// to case the same way the endpoint resolves names.
pub const PUBLIC_OPERATIONS: [&str; 3] = ["login", "signup", "verifyCustomer"];

pub const CUSTOMER_ID_CLAIM: &str = "customerID";
pub const USER_UID_CLAIM: &str = "userUID";
pub const ROLE_CLAIM: &str = "role";
pub const USER_NAME_CLAIM: &str = "userName";

/// Resolves the request's [`Session`] from its bearer assertion and stores
/// it in the request extensions.
pub struct AuthMiddleware {
    verifier: Arc<dyn IdentityVerifier>,
}

impl AuthMiddleware {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        AuthMiddleware { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);

        // preflight and playground requests carry no operation
        if req.method() == Method::OPTIONS || req.method() == Method::GET {
            return Box::pin(async move { srv.call(req).await.map(|res| res.map_into_boxed_body()) });
        }

        let verifier = self.verifier.clone();
        let token_value = bearer_token(req.request());

        Box::pin(async move {
            let mut payload = req.take_payload();
            let body = extract_body(&mut payload).await?;
            req.set_payload(restore_payload(body.clone()));

            let operation = match serde_json::from_slice::<GraphQLRequest>(&body) {
                Ok(request) => request,
                Err(e) => {
                    debug!("Rejecting unreadable GraphQL body: {}", e);
                    return Ok(reject(req, AppError::BadRequest("invalid request body".to_string())));
                }
            };

            let Some(operation_name) = operation.operation_name.as_deref() else {
                return Ok(reject(req, AppError::BadRequest("missing operationName".to_string())));
            };

            if is_public(operation_name) {
                return srv.call(req).await.map(|res| res.map_into_boxed_body());
            }

            // the kind comes from the named operation, never from the document text;
            // unknown names get the mutation treatment
            let kind = Operation::from_name(operation_name)
                .map(Operation::kind)
                .unwrap_or(OperationKind::Mutation);

            // queries are never rejected here; a verifiable assertion still yields a session
            if kind == OperationKind::Query {
                if let Some(token) = token_value {
                    match resolve_session(verifier.as_ref(), &token).await {
                        Ok(session) => {
                            req.extensions_mut().insert(session);
                        }
                        Err(e) => debug!("Query {} stays anonymous: {}", operation_name, e),
                    }
                }
                return srv.call(req).await.map(|res| res.map_into_boxed_body());
            }

            let Some(token) = token_value else {
                return Ok(reject(
                    req,
                    AppError::Unauthorized("No authorization token provided".to_string()),
                ));
            };

            match resolve_session(verifier.as_ref(), &token).await {
                Ok(session) => {
                    req.extensions_mut().insert(session);
                    srv.call(req).await.map(|res| res.map_into_boxed_body())
                }
                Err(e) => {
                    warn!("Rejected {} request: {}", operation_name, e);
                    Ok(reject(req, e))
                }
            }
        })
    }
}

fn is_public(operation_name: &str) -> bool {
    PUBLIC_OPERATIONS
        .iter()
        .any(|public| public.eq_ignore_ascii_case(operation_name))
}

fn reject(req: ServiceRequest, error: AppError) -> ServiceResponse<BoxBody> {
    let response: HttpResponse = error.to_http_response();
    req.into_response(response.map_into_boxed_body())
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Verifies a bearer assertion and turns its custom claims into a session.
pub async fn resolve_session(verifier: &dyn IdentityVerifier, assertion: &str) -> Res<Session> {
    verifier
        .verify(assertion)
        .await
        .map_err(|e| AppError::Unauthorized(format!("invalid session token: {}", e)))?;

    let claims = verifier
        .decode(assertion)
        .map_err(|e| AppError::Unauthorized(format!("undecodable session token: {}", e)))?;

    session_from_claims(claims)
}

fn session_from_claims(claims: IdentityClaims) -> Res<Session> {
    let customer_uid = uuid_claim(&claims, CUSTOMER_ID_CLAIM)?;
    let user_uid = uuid_claim(&claims, USER_UID_CLAIM)?;
    let role = required_claim(&claims, ROLE_CLAIM)?.to_string();
    let user_name = claims
        .custom_str(USER_NAME_CLAIM)
        .unwrap_or_default()
        .to_string();

    Ok(Session {
        subject_id: claims.subject.clone(),
        user_uid,
        customer_uid,
        role,
        user_name,
        claims,
    })
}

fn required_claim<'a>(claims: &'a IdentityClaims, name: &str) -> Res<&'a str> {
    claims
        .custom_str(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {} claim", name)))
}

fn uuid_claim(claims: &IdentityClaims, name: &str) -> Res<Uuid> {
    Uuid::parse_str(required_claim(claims, name)?)
        .map_err(|_| AppError::Unauthorized(format!("malformed {} claim", name)))
}

async fn extract_body(payload: &mut Payload) -> Result<Bytes, Error> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        body.extend_from_slice(&chunk?);
    }
    Ok(body.freeze())
}

fn restore_payload(body: Bytes) -> Payload {
    let stream = futures::stream::once(async move { Ok::<Bytes, actix_web::error::PayloadError>(body) });
    Payload::from(
        Box::pin(stream) as Pin<Box<dyn futures::Stream<Item = Result<Bytes, actix_web::error::PayloadError>>>>
    )
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, test, web};
    use common::identity::MockIdentityVerifier;
    use serde_json::{Map, Value, json};

    use super::*;

    const CUSTOMER: &str = "0b8f3c1e-5a43-4c7e-9a59-3f0d2b1c4e11";
    const USER: &str = "6a1d2f9e-7c3b-4e8a-b1f0-2d9c8e7a6b54";

    fn claims(custom: Value) -> IdentityClaims {
        let custom: Map<String, Value> = serde_json::from_value(custom).unwrap();
        IdentityClaims {
            subject: "user_2zH".to_string(),
            custom,
        }
    }

    fn verifier_returning(claims: IdentityClaims) -> MockIdentityVerifier {
        let mut verifier = MockIdentityVerifier::new();
        verifier.expect_verify().returning(|_| Ok(()));
        verifier
            .expect_decode()
            .returning(move |_| Ok(claims.clone()));
        verifier
    }

    #[actix_web::test]
    async fn resolves_full_session() {
        let verifier = verifier_returning(claims(json!({
            "customerID": CUSTOMER,
            "userUID": USER,
            "role": "owner",
            "userName": "Jane",
        })));

        let session = resolve_session(&verifier, "token").await.unwrap();
        assert_eq!(session.subject_id, "user_2zH");
        assert_eq!(session.customer_uid.to_string(), CUSTOMER);
        assert_eq!(session.user_uid.to_string(), USER);
        assert_eq!(session.role, "owner");
        assert_eq!(session.user_name, "Jane");
    }

    #[actix_web::test]
    async fn display_name_is_optional() {
        let verifier = verifier_returning(claims(json!({
            "customerID": CUSTOMER,
            "userUID": USER,
            "role": "member",
        })));

        let session = resolve_session(&verifier, "token").await.unwrap();
        assert_eq!(session.user_name, "");
    }

    #[actix_web::test]
    async fn missing_role_is_unauthenticated() {
        let verifier = verifier_returning(claims(json!({
            "customerID": CUSTOMER,
            "userUID": USER,
        })));

        let result = resolve_session(&verifier, "token").await;
        assert!(matches!(result, Err(AppError::Unauthorized(msg)) if msg.contains("role")));
    }

    #[actix_web::test]
    async fn malformed_ids_are_unauthenticated() {
        let verifier = verifier_returning(claims(json!({
            "customerID": "acme",
            "userUID": USER,
            "role": "owner",
        })));

        assert!(matches!(
            resolve_session(&verifier, "token").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[actix_web::test]
    async fn failed_verification_skips_decoding() {
        let mut verifier = MockIdentityVerifier::new();
        verifier
            .expect_verify()
            .returning(|_| Err(AppError::Unauthorized("expired".to_string())));
        verifier.expect_decode().never();

        assert!(matches!(
            resolve_session(&verifier, "token").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    async fn echo_session(session: Option<web::ReqData<Session>>) -> HttpResponse {
        match session {
            Some(session) => HttpResponse::Ok().body(session.role.clone()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    macro_rules! app {
        ($verifier:expr) => {
            test::init_service(
                App::new()
                    .wrap(AuthMiddleware::new(Arc::new($verifier)))
                    .route("/graphql", web::post().to(echo_session))
                    .route("/graphql", web::get().to(echo_session)),
            )
            .await
        };
    }

    fn mutation(name: &str) -> Value {
        json!({
            "operationName": name,
            "query": format!("mutation {}($input: Input!) {{ {}(input: $input) {{ id }} }}", name, name),
            "variables": {},
        })
    }

    #[actix_web::test]
    async fn mutation_with_valid_token_reaches_handler_with_session() {
        let app = app!(verifier_returning(claims(json!({
            "customerID": CUSTOMER,
            "userUID": USER,
            "role": "owner",
        }))));

        let req = test::TestRequest::post()
            .uri("/graphql")
            .insert_header(("Authorization", "Bearer token"))
            .set_json(mutation("createEmailRecipient"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert!(res.status().is_success());
        assert_eq!(test::read_body(res).await, "owner");
    }

    #[actix_web::test]
    async fn mutation_without_token_is_rejected() {
        let app = app!(MockIdentityVerifier::new());

        let req = test::TestRequest::post()
            .uri("/graphql")
            .set_json(mutation("createEmailRecipient"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), 401);
    }

    #[actix_web::test]
    async fn token_without_role_is_rejected() {
        let app = app!(verifier_returning(claims(json!({
            "customerID": CUSTOMER,
            "userUID": USER,
        }))));

        let req = test::TestRequest::post()
            .uri("/graphql")
            .insert_header(("Authorization", "Bearer token"))
            .set_json(mutation("createEmailRecipient"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), 401);
        let body: Value = test::read_body_json(res).await;
        assert!(body["error"].as_str().unwrap().contains("role"));
    }

    #[actix_web::test]
    async fn public_operations_and_queries_pass_anonymously() {
        let app = app!(MockIdentityVerifier::new());

        for body in [
            mutation("signup"),
            mutation("verifyCustomer"),
            json!({ "operationName": "getCustomer", "query": "query getCustomer { getCustomer { id } }" }),
        ] {
            let req = test::TestRequest::post()
                .uri("/graphql")
                .set_json(body)
                .to_request();
            let res = test::call_service(&app, req).await;
            assert!(res.status().is_success());
            assert_eq!(test::read_body(res).await, "anonymous");
        }
    }

    #[actix_web::test]
    async fn public_names_match_in_any_case() {
        let app = app!(MockIdentityVerifier::new());

        for name in ["Signup", "SIGNUP", "VerifyCustomer", "Login"] {
            let req = test::TestRequest::post()
                .uri("/graphql")
                .set_json(mutation(name))
                .to_request();
            let res = test::call_service(&app, req).await;
            assert!(res.status().is_success(), "{} was rejected", name);
            assert_eq!(test::read_body(res).await, "anonymous");
        }
    }

    #[actix_web::test]
    async fn mutation_dressed_as_query_still_needs_a_session() {
        let mut verifier = MockIdentityVerifier::new();
        verifier
            .expect_verify()
            .returning(|_| Err(AppError::Unauthorized("expired".to_string())));
        let app = app!(verifier);
        let body = json!({
            "operationName": "deleteTrackedCompany",
            "query": "{ a }",
            "variables": { "input": { "trackedCompanyUID": CUSTOMER } },
        });

        let anonymous = test::TestRequest::post()
            .uri("/graphql")
            .set_json(body.clone())
            .to_request();
        assert_eq!(test::call_service(&app, anonymous).await.status(), 401);

        let stale = test::TestRequest::post()
            .uri("/graphql")
            .insert_header(("Authorization", "Bearer stale"))
            .set_json(body)
            .to_request();
        assert_eq!(test::call_service(&app, stale).await.status(), 401);
    }

    #[actix_web::test]
    async fn unknown_operations_need_a_session() {
        let app = app!(MockIdentityVerifier::new());

        let req = test::TestRequest::post()
            .uri("/graphql")
            .set_json(json!({ "operationName": "listEverything", "query": "query listEverything { x }" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }

    #[actix_web::test]
    async fn queries_pick_up_session_when_token_verifies() {
        let app = app!(verifier_returning(claims(json!({
            "customerID": CUSTOMER,
            "userUID": USER,
            "role": "member",
        }))));

        let req = test::TestRequest::post()
            .uri("/graphql")
            .insert_header(("Authorization", "Bearer token"))
            .set_json(json!({ "operationName": "getCustomer", "query": "{ getCustomer { id } }" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(test::read_body(res).await, "member");
    }

    #[actix_web::test]
    async fn queries_with_bad_token_stay_anonymous() {
        let mut verifier = MockIdentityVerifier::new();
        verifier
            .expect_verify()
            .returning(|_| Err(AppError::Unauthorized("expired".to_string())));
        let app = app!(verifier);

        let req = test::TestRequest::post()
            .uri("/graphql")
            .insert_header(("Authorization", "Bearer stale"))
            .set_json(json!({ "operationName": "getCustomer", "query": "query getCustomer { getCustomer { id } }" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
        assert_eq!(test::read_body(res).await, "anonymous");
    }

    #[actix_web::test]
    async fn get_requests_pass_through() {
        let app = app!(MockIdentityVerifier::new());

        let req = test::TestRequest::get().uri("/graphql").to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
    }

    #[actix_web::test]
    async fn unreadable_bodies_are_bad_requests() {
        let app = app!(MockIdentityVerifier::new());

        let req = test::TestRequest::post()
            .uri("/graphql")
            .set_payload("not json")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/graphql")
            .set_json(json!({ "query": "mutation { x }" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
