use std::sync::Arc;

use api_auth::services::auth::VerificationMailer;
use common::{
    env_config::{AppUrls, Config},
    identity::IdentityAdmin,
    jwt::InviteTokenCodec,
    mail::Mailer,
};
use db::store::Store;

/// Everything an operation may need, shared by all workers.
pub struct AppState<S: Store> {
    pub store: S,
    pub mailer: Arc<dyn Mailer>,
    pub identity: Arc<dyn IdentityAdmin>,
    pub invites: InviteTokenCodec,
    pub sender_name: String,
    pub app_urls: AppUrls,
}

impl<S: Store> AppState<S> {
    pub fn new(
        store: S,
        mailer: Arc<dyn Mailer>,
        identity: Arc<dyn IdentityAdmin>,
        config: &Config,
    ) -> Self {
        AppState {
            store,
            mailer,
            identity,
            invites: InviteTokenCodec::new(&config.invite_config),
            sender_name: config.mail_config.sender_name.clone(),
            app_urls: config.app_urls.clone(),
        }
    }

    pub fn verification_mailer(&self) -> VerificationMailer<'_> {
        VerificationMailer {
            mailer: self.mailer.as_ref(),
            sender_name: &self.sender_name,
            app_urls: &self.app_urls,
        }
    }
}
