use actix_web::web;
use db::store::Store;

pub mod normalizer;
pub mod operations;
pub mod state;
pub mod routes {
    pub mod graphql;
    pub mod health;
}

/// The single GraphQL resource. Callers wrap it with the session resolver.
pub fn mount_graphql<S: Store>() -> actix_web::Resource {
    web::resource("/graphql").route(web::post().to(routes::graphql::post_graphql::<S>))
}
