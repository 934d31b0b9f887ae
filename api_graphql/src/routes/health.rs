use actix_web::{Responder, get};
use common::{error::Res, http::Success};
use serde_json::json;

/// Liveness check.
#[get("/health")]
pub async fn get_health() -> Res<impl Responder> {
    Success::ok(json!({ "status": "ok" }))
}
