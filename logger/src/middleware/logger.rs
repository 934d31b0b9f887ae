use std::{pin::Pin, rc::Rc, time::Instant};

use actix_web::{
    Error, HttpMessage,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Method,
    web::{self, Bytes},
};
use colored::Colorize;
use common::{graphql::GraphQLRequest, session::Session};
use futures::{
    StreamExt,
    future::{LocalBoxFuture, Ready, ready},
};
use log::info;

/// Logs one line per request: status, method, path, elapsed time, GraphQL
/// operation and the session user when one was resolved.
pub struct LoggerMiddleware {}

impl LoggerMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for LoggerMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = LoggerMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let method = req.method().clone();
        let path = req.path().to_string();
        let srv = Rc::clone(&self.service);

        Box::pin(async move {
            let started = Instant::now();

            // only GraphQL posts carry an operation name
            let operation = if method == Method::POST {
                let mut payload = req.take_payload();
                let body = extract_body(&mut payload).await?;
                let operation = operation_name(&body);
                req.set_payload(restore_payload(body));
                operation
            } else {
                None
            };

            let res = srv.call(req).await?;

            let status = res.status().as_u16();
            let user_uid = res
                .request()
                .extensions()
                .get::<Session>()
                .map(|s| s.user_uid.to_string());

            let colored_status = match status {
                200..=299 => status.to_string().green(),
                300..=399 => status.to_string().yellow(),
                400..=499 => status.to_string().bright_red(),
                _ => status.to_string().red(),
            };

            let colored_method = match method.as_str() {
                "GET" => method.as_str().blue(),
                "POST" => method.as_str().yellow(),
                "OPTIONS" => method.as_str().bright_black(),
                _ => method.as_str().normal(),
            };

            info!(
                "[{}] {} {} {} operation={} user={}",
                colored_status,
                colored_method,
                path.bright_white(),
                format!("({}ms)", started.elapsed().as_millis()).bright_black(),
                operation.as_deref().unwrap_or("-").bright_cyan(),
                user_uid.as_deref().unwrap_or("-").bright_blue(),
            );

            Ok(res)
        })
    }
}

fn operation_name(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<GraphQLRequest>(body)
        .ok()
        .and_then(|request| request.operation_name)
}

fn restore_payload(body: Bytes) -> Payload {
    let stream: Pin<
        Box<dyn futures::Stream<Item = Result<Bytes, actix_web::error::PayloadError>>>,
    > = futures::stream::once(async move { Ok::<Bytes, actix_web::error::PayloadError>(body) })
        .boxed_local();
    Payload::from(stream)
}

async fn extract_body(payload: &mut Payload) -> Result<Bytes, Error> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, test};

    use super::*;

    #[::core::prelude::v1::test]
    fn operation_name_is_read_from_graphql_body() {
        let body = br#"{"operationName":"getCustomer","query":"query getCustomer { x }"}"#;
        assert_eq!(operation_name(body).as_deref(), Some("getCustomer"));
        assert_eq!(operation_name(b"not json"), None);
        assert_eq!(operation_name(br#"{"query":"{ x }"}"#), None);
    }

    #[actix_web::test]
    async fn body_survives_logging() {
        let app = test::init_service(App::new().wrap(LoggerMiddleware::new()).route(
            "/graphql",
            web::post().to(|body: Bytes| async move { HttpResponse::Ok().body(body) }),
        ))
        .await;

        let payload = r#"{"operationName":"signup","query":"mutation signup { x }"}"#;
        let req = test::TestRequest::post()
            .uri("/graphql")
            .set_payload(payload)
            .to_request();
        let body = test::call_and_read_body(&app, req).await;

        assert_eq!(body, Bytes::from(payload));
    }
}
