mod cors;

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use api_graphql::{routes::health::get_health, state::AppState};
use common::{
    env_config::Config,
    identity::{ClerkClient, IdentityAdmin, IdentityVerifier},
    mail::{HttpMailer, Mailer},
};
use db::store::PgStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();

    // init logger
    if config.console_logging_enabled {
        logger::setup().expect("Failed to set up logger");
    }

    // hosted databases are only reachable over TLS
    let pool = db::setup(&config.database_url, !config.environment.is_local(), 10)
        .await
        .expect("Failed to set up database");

    // identity provider serves both session checks and user management
    let clerk = Arc::new(
        ClerkClient::new(&config.clerk_config).expect("Failed to set up identity provider"),
    );
    let verifier: Arc<dyn IdentityVerifier> = clerk.clone();
    let identity: Arc<dyn IdentityAdmin> = clerk;
    let mailer: Arc<dyn Mailer> = Arc::new(HttpMailer::new(config.mail_config.clone()));

    let state = web::Data::new(AppState::new(
        PgStore::new(pool),
        mailer,
        identity,
        &config,
    ));
    let origin = config.cors_allowed_origin.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(logger::middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(get_health)
            .service(
                api_graphql::mount_graphql::<PgStore>()
                    .wrap(api_auth::auth_middleware(verifier.clone())),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
