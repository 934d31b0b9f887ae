use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, Res},
    identity::IdentityClaims,
};

/// Authenticated identity for one request. Built once by the session
/// middleware and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Identity provider subject.
    pub subject_id: String,
    pub user_uid: Uuid,
    pub customer_uid: Uuid,
    pub role: String,
    /// Empty when the assertion carries no display name.
    pub user_name: String,
    /// The verified assertion the session was derived from.
    pub claims: IdentityClaims,
}

/// Per-request context threaded explicitly into every business operation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    session: Option<Arc<Session>>,
}

impl RequestContext {
    pub fn new(session: Option<Session>) -> Self {
        RequestContext {
            session: session.map(Arc::new),
        }
    }

    pub fn anonymous() -> Self {
        RequestContext::default()
    }

    pub fn session(&self) -> Res<&Session> {
        self.session
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("no session".to_string()))
    }

    pub fn current_user_uid(&self) -> Res<Uuid> {
        self.session().map(|s| s.user_uid)
    }

    pub fn current_customer_uid(&self) -> Res<Uuid> {
        self.session().map(|s| s.customer_uid)
    }

    pub fn current_subject_id(&self) -> Res<&str> {
        self.session().map(|s| s.subject_id.as_str())
    }
}
