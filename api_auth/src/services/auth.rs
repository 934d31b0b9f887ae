use chrono::Utc;
use common::{
    env_config::AppUrls,
    error::{AppError, ErrorCode, FieldError, GraphQLError, Res},
    identity::IdentityAdmin,
    mail::{self, Mailer},
    misc::domain_from_email,
};
use db::{
    dtos::{
        customer::{CustomerCreateRequest, VerificationSentUpdate},
        user::UserCreateRequest,
    },
    models::user::User,
    store::{Store, UnitOfWork},
};
use log::{error, info, warn};
use serde_json::json;

use crate::{
    dtos::signup::{
        SignupRequest, SignupResponse, UserResponse, VerifyCustomerResponse,
    },
    services::verification,
};

pub const OWNER_ROLE: &str = "owner";

/// Where and how the verification email is sent.
pub struct VerificationMailer<'a> {
    pub mailer: &'a dyn Mailer,
    pub sender_name: &'a str,
    pub app_urls: &'a AppUrls,
}

pub fn verification_link(app_urls: &AppUrls, token: &str) -> String {
    format!(
        "{}/verify-account/{}",
        app_urls.base_url().trim_end_matches('/'),
        token
    )
}

fn validate_signup(request: &SignupRequest) -> Res<()> {
    let mut fields = Vec::new();
    if request.email.trim().is_empty() || !request.email.contains('@') {
        fields.push(FieldError::new("email", "A valid email address is required"));
    }
    if request.password.is_empty() {
        fields.push(FieldError::new("password", "Password is required"));
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(GraphQLError::inline(ErrorCode::ValidationError, fields).into())
    }
}

/// Registers the owner with the identity provider, then bootstraps the
/// customer and its first user.
pub async fn signup<S: Store>(
    store: &S,
    identity: &dyn IdentityAdmin,
    mail: &VerificationMailer<'_>,
    request: SignupRequest,
) -> Res<SignupResponse> {
    validate_signup(&request)?;

    let clerk_id = identity
        .create_user(&request.email, &request.password)
        .await?;

    let user = create_owner(store, mail, &request.email, &clerk_id)
        .await
        .inspect_err(|e| {
            warn!(
                "Signup for {} failed after identity {} was created: {}",
                request.email, clerk_id, e
            )
        })?;

    let customer_uid = user
        .customer_uid
        .ok_or_else(|| AppError::Internal("owner has no customer".to_string()))?;

    Ok(SignupResponse {
        user_id: user.user_uid,
        customer_uid,
        clerk_id,
    })
}

/// Creates a customer and its owning user as one unit of record and emails
/// the verification link.
///
/// Nothing is committed unless the email was sent. Any failure rolls the
/// transaction back and the original error is returned.
pub async fn create_owner<S: Store>(
    store: &S,
    mail: &VerificationMailer<'_>,
    email: &str,
    subject_id: &str,
) -> Res<UserResponse> {
    let mut tx = store.begin().await?;

    match create_owner_in(&mut tx, mail, email, subject_id).await {
        Ok(user) => {
            tx.commit().await?;
            info!("Customer {:?} created for {}", user.customer_uid, email);
            Ok(user.into())
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!("Signup rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn create_owner_in<T: UnitOfWork>(
    tx: &mut T,
    mail: &VerificationMailer<'_>,
    email: &str,
    subject_id: &str,
) -> Res<User> {
    let user = tx
        .create_user(UserCreateRequest {
            email: email.to_string(),
            is_verified: false,
            customer_uid: None,
            clerk_id: Some(subject_id.to_string()),
        })
        .await?;

    let customer = tx
        .create_customer(CustomerCreateRequest {
            email: email.to_string(),
            is_verified: false,
        })
        .await?;

    tx.update_user_customer(user.id, customer.customer_uid)
        .await?;
    tx.update_customer_owner(customer.id, user.id).await?;

    let token = verification::issue_token(tx, customer.customer_uid).await?;
    let link = verification_link(mail.app_urls, &token);

    mail.mailer
        .send_mail(
            email,
            &mail::verification_subject(mail.sender_name),
            &mail::verification_email(mail.sender_name, &link, email),
        )
        .await?;

    tx.mark_verification_sent(
        customer.customer_uid,
        VerificationSentUpdate {
            domain: domain_from_email(email),
            sent_at: Utc::now(),
        },
    )
    .await?;

    tx.get_user_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {} vanished during signup", user.id)))
}

/// Consumes an emailed verification token.
///
/// On a match the owner's custom claims are published to the identity
/// provider and a sign-in token is returned. Provider failures after the
/// customer is verified only cost the sign-in token.
pub async fn verify_customer<S: Store>(
    store: &S,
    identity: &dyn IdentityAdmin,
    token: &str,
) -> Res<VerifyCustomerResponse> {
    let mut repo = store.clone();

    let verification = match verification::validate_token(&mut repo, token).await? {
        Some(verification) if verification.matched => verification,
        _ => {
            return Ok(VerifyCustomerResponse {
                success: false,
                token: None,
            });
        }
    };

    let customer = verification.customer;
    let owner = match customer.owner_id {
        Some(owner_id) => repo.get_user_by_id(owner_id).await?,
        None => None,
    };

    let Some((owner, subject)) = owner.and_then(|u| u.clerk_id.clone().map(|id| (u, id))) else {
        warn!("Verified customer {} has no linked identity", customer.customer_uid);
        return Ok(VerifyCustomerResponse {
            success: true,
            token: None,
        });
    };

    let metadata = json!({
        "customerID": customer.customer_uid.to_string(),
        "userUID": owner.user_uid.to_string(),
        "verified": true,
        "role": OWNER_ROLE,
    });

    let token = match publish_owner(identity, &subject, metadata).await {
        Ok(token) => Some(token),
        Err(e) => {
            error!(
                "Could not finish identity setup for customer {}: {}",
                customer.customer_uid, e
            );
            None
        }
    };

    Ok(VerifyCustomerResponse {
        success: true,
        token,
    })
}

async fn publish_owner(
    identity: &dyn IdentityAdmin,
    subject: &str,
    metadata: serde_json::Value,
) -> Res<String> {
    identity.update_public_metadata(subject, metadata).await?;
    identity.create_sign_in_token(subject).await
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use common::{
        env_config::Environment,
        identity::MockIdentityAdmin,
        mail::MockMailer,
    };
    use db::{memory::MemoryStore, store::CustomerRepository};

    use super::*;

    fn urls(environment: Environment) -> AppUrls {
        AppUrls {
            environment,
            local_url: "http://localhost:3000".to_string(),
            hosted_url: "https://app.rively.io/".to_string(),
        }
    }

    fn capturing_mailer(sent: Arc<Mutex<Vec<String>>>) -> MockMailer {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send_mail()
            .times(1)
            .returning(move |_, _, body| {
                sent.lock().unwrap().push(body.to_string());
                Ok(())
            });
        mailer
    }

    #[test]
    fn link_follows_environment() {
        assert_eq!(
            verification_link(&urls(Environment::Local), "c.s"),
            "http://localhost:3000/verify-account/c.s"
        );
        assert_eq!(
            verification_link(&urls(Environment::Hosted), "c.s"),
            "https://app.rively.io/verify-account/c.s"
        );
    }

    #[actix_web::test]
    async fn owner_and_customer_reference_each_other() {
        let store = MemoryStore::new();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mailer = capturing_mailer(sent.clone());
        let app_urls = urls(Environment::Local);
        let mail = VerificationMailer {
            mailer: &mailer,
            sender_name: "Rively",
            app_urls: &app_urls,
        };

        let user = create_owner(&store, &mail, "jane@acme.io", "user_2zH")
            .await
            .unwrap();
        assert!(!user.is_verified);

        let state = store.snapshot();
        assert_eq!(state.users.len(), 1);
        assert_eq!(state.customers.len(), 1);
        let (owner, customer) = (&state.users[0], &state.customers[0]);
        assert_eq!(owner.customer_uid, Some(customer.customer_uid));
        assert_eq!(customer.owner_id, Some(owner.id));
        assert_eq!(owner.clerk_id.as_deref(), Some("user_2zH"));
        assert_eq!(customer.domain.as_deref(), Some("acme"));
        assert!(customer.verification_token_sent_at.is_some());
        assert_eq!(user.customer_uid, Some(customer.customer_uid));

        let secret = customer.verification_token.clone().unwrap();
        let expected_link = format!(
            "http://localhost:3000/verify-account/{}.{}",
            customer.customer_uid, secret
        );
        assert!(sent.lock().unwrap()[0].contains(&expected_link));
    }

    #[actix_web::test]
    async fn mail_failure_leaves_nothing_behind() {
        let store = MemoryStore::new();
        let mut mailer = MockMailer::new();
        mailer
            .expect_send_mail()
            .returning(|_, _, _| Err(AppError::Internal("mail api down".to_string())));
        let app_urls = urls(Environment::Hosted);
        let mail = VerificationMailer {
            mailer: &mailer,
            sender_name: "Rively",
            app_urls: &app_urls,
        };

        let result = create_owner(&store, &mail, "jane@acme.io", "user_2zH").await;

        assert!(matches!(result, Err(AppError::Internal(msg)) if msg == "mail api down"));
        let state = store.snapshot();
        assert!(state.users.is_empty());
        assert!(state.customers.is_empty());
    }

    #[actix_web::test]
    async fn failed_rollback_still_reports_the_mail_error() {
        let store = MemoryStore::new();
        store.fail_on("rollback");
        let mut mailer = MockMailer::new();
        mailer
            .expect_send_mail()
            .times(1)
            .returning(|_, _, _| Err(AppError::Internal("mail api down".to_string())));
        let app_urls = urls(Environment::Local);
        let mail = VerificationMailer {
            mailer: &mailer,
            sender_name: "Rively",
            app_urls: &app_urls,
        };

        let result = create_owner(&store, &mail, "jane@acme.io", "user_2zH").await;

        assert!(matches!(result, Err(AppError::Internal(msg)) if msg == "mail api down"));
        let state = store.snapshot();
        assert!(state.users.is_empty());
        assert!(state.customers.is_empty());
    }

    #[actix_web::test]
    async fn late_step_failure_rolls_back() {
        let store = MemoryStore::new();
        store.fail_on("mark_verification_sent");
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mailer = capturing_mailer(sent.clone());
        let app_urls = urls(Environment::Local);
        let mail = VerificationMailer {
            mailer: &mailer,
            sender_name: "Rively",
            app_urls: &app_urls,
        };

        assert!(create_owner(&store, &mail, "jane@acme.io", "user_2zH").await.is_err());
        // The email already went out; only the rows are gone.
        assert_eq!(sent.lock().unwrap().len(), 1);
        assert!(store.snapshot().users.is_empty());
        assert!(store.snapshot().customers.is_empty());
    }

    #[actix_web::test]
    async fn signup_rejects_invalid_input_before_side_effects() {
        let store = MemoryStore::new();
        let identity = MockIdentityAdmin::new();
        let mailer = MockMailer::new();
        let app_urls = urls(Environment::Local);
        let mail = VerificationMailer {
            mailer: &mailer,
            sender_name: "Rively",
            app_urls: &app_urls,
        };

        let err = signup(
            &store,
            &identity,
            &mail,
            SignupRequest {
                email: "nope".to_string(),
                password: String::new(),
            },
        )
        .await
        .unwrap_err();

        let AppError::GraphQL(shape) = err else {
            panic!("expected a structured error");
        };
        assert_eq!(shape.code, ErrorCode::ValidationError);
        assert_eq!(shape.fields.len(), 2);
    }

    #[actix_web::test]
    async fn signup_then_verify_issues_sign_in_token() {
        let store = MemoryStore::new();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mailer = capturing_mailer(sent.clone());
        let app_urls = urls(Environment::Local);
        let mail = VerificationMailer {
            mailer: &mailer,
            sender_name: "Rively",
            app_urls: &app_urls,
        };

        let mut identity = MockIdentityAdmin::new();
        identity
            .expect_create_user()
            .returning(|_, _| Ok("user_2zH".to_string()));
        identity
            .expect_update_public_metadata()
            .times(1)
            .returning(|subject, metadata| {
                assert_eq!(subject, "user_2zH");
                assert_eq!(metadata["role"], "owner");
                assert_eq!(metadata["verified"], true);
                Ok(())
            });
        identity
            .expect_create_sign_in_token()
            .returning(|_| Ok("sit_123".to_string()));

        let created = signup(
            &store,
            &identity,
            &mail,
            SignupRequest {
                email: "jane@acme.io".to_string(),
                password: "hunter2".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(created.clerk_id, "user_2zH");

        let mut repo = store.clone();
        let customer = repo
            .get_customer_by_uid(created.customer_uid)
            .await
            .unwrap()
            .unwrap();
        let token = verification::compose_token(
            customer.customer_uid,
            customer.verification_token.as_deref().unwrap(),
        );

        let verified = verify_customer(&store, &identity, &token).await.unwrap();
        assert_eq!(
            verified,
            VerifyCustomerResponse {
                success: true,
                token: Some("sit_123".to_string()),
            }
        );
        assert!(store.snapshot().customers[0].is_verified);
    }

    #[actix_web::test]
    async fn verify_with_bad_token_reports_failure() {
        let store = MemoryStore::new();
        let identity = MockIdentityAdmin::new();

        let response = verify_customer(&store, &identity, "garbage").await.unwrap();
        assert_eq!(
            response,
            VerifyCustomerResponse {
                success: false,
                token: None,
            }
        );
    }

    #[actix_web::test]
    async fn identity_failure_after_verification_keeps_customer_verified() {
        let store = MemoryStore::new();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mailer = capturing_mailer(sent);
        let app_urls = urls(Environment::Local);
        let mail = VerificationMailer {
            mailer: &mailer,
            sender_name: "Rively",
            app_urls: &app_urls,
        };
        create_owner(&store, &mail, "jane@acme.io", "user_2zH").await.unwrap();
        let customer = store.snapshot().customers[0].clone();

        let mut identity = MockIdentityAdmin::new();
        identity
            .expect_update_public_metadata()
            .returning(|_, _| Err(AppError::Internal("provider down".to_string())));

        let token = verification::compose_token(
            customer.customer_uid,
            customer.verification_token.as_deref().unwrap(),
        );
        let response = verify_customer(&store, &identity, &token).await.unwrap();

        assert!(response.success);
        assert_eq!(response.token, None);
        assert!(store.snapshot().customers[0].is_verified);
    }
}
