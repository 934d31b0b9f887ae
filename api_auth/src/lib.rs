use std::sync::Arc;

use common::identity::IdentityVerifier;
use middleware::auth::AuthMiddleware;

pub mod middleware {
    pub mod auth;
}
pub mod services {
    pub mod auth;
    pub mod verification;
}
pub mod dtos {
    pub mod signup;
}

// Session resolver for the GraphQL endpoint
pub fn auth_middleware(verifier: Arc<dyn IdentityVerifier>) -> AuthMiddleware {
    AuthMiddleware::new(verifier)
}
