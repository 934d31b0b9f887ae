//! External identity provider (Clerk).
//!
//! Session tokens are RS256 JWTs verified offline against the instance's PEM
//! public key. User management goes through the backend REST API.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use log::{info, warn};
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    env_config::ClerkConfig,
    error::{AppError, Res},
};

/// Decoded bearer assertion: the provider's subject plus every other claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl IdentityClaims {
    pub fn custom_str(&self, key: &str) -> Option<&str> {
        self.custom.get(key).and_then(Value::as_str)
    }
}

#[automock]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Checks signature and freshness of a bearer assertion.
    async fn verify(&self, assertion: &str) -> Res<()>;

    /// Extracts subject and custom claims from an assertion.
    fn decode(&self, assertion: &str) -> Res<IdentityClaims>;
}

#[automock]
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Registers a user with the provider and returns its subject id.
    async fn create_user(&self, email: &str, password: &str) -> Res<String>;

    async fn update_public_metadata(&self, subject: &str, metadata: Value) -> Res<()>;

    /// Short-lived token the client exchanges for a session.
    async fn create_sign_in_token(&self, subject: &str) -> Res<String>;
}

#[derive(Debug, Deserialize)]
struct CreatedUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SignInToken {
    token: String,
}

pub struct ClerkClient {
    client: Client,
    api_url: String,
    secret_key: String,
    decoding_key: DecodingKey,
}

impl ClerkClient {
    pub fn new(config: &ClerkConfig) -> Res<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(config.jwt_public_key.as_bytes())?;
        Ok(ClerkClient {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            decoding_key,
        })
    }

    fn decode_verified(&self, assertion: &str) -> Res<IdentityClaims> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 5;
        let token = jsonwebtoken::decode::<IdentityClaims>(assertion, &self.decoding_key, &validation)?;
        Ok(token.claims)
    }

    async fn check_status(response: reqwest::Response, action: &str) -> Res<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!("Identity provider failed to {}: {} {}", action, status, body);
        Err(AppError::Internal(format!(
            "Identity provider failed to {}: {}",
            action, status
        )))
    }
}

#[async_trait]
impl IdentityVerifier for ClerkClient {
    async fn verify(&self, assertion: &str) -> Res<()> {
        self.decode_verified(assertion).map(|_| ())
    }

    fn decode(&self, assertion: &str) -> Res<IdentityClaims> {
        self.decode_verified(assertion)
    }
}

#[async_trait]
impl IdentityAdmin for ClerkClient {
    async fn create_user(&self, email: &str, password: &str) -> Res<String> {
        let response = self
            .client
            .post(format!("{}/users", self.api_url))
            .bearer_auth(&self.secret_key)
            .json(&serde_json::json!({
                "email_address": [email],
                "password": password,
            }))
            .send()
            .await?;
        let user: CreatedUser = Self::check_status(response, "create user")
            .await?
            .json()
            .await?;
        info!("Created identity provider user {}", user.id);
        Ok(user.id)
    }

    async fn update_public_metadata(&self, subject: &str, metadata: Value) -> Res<()> {
        let response = self
            .client
            .patch(format!("{}/users/{}/metadata", self.api_url, subject))
            .bearer_auth(&self.secret_key)
            .json(&serde_json::json!({ "public_metadata": metadata }))
            .send()
            .await?;
        Self::check_status(response, "update metadata").await?;
        Ok(())
    }

    async fn create_sign_in_token(&self, subject: &str) -> Res<String> {
        let response = self
            .client
            .post(format!("{}/sign_in_tokens", self.api_url))
            .bearer_auth(&self.secret_key)
            .json(&serde_json::json!({ "user_id": subject }))
            .send()
            .await?;
        let token: SignInToken = Self::check_status(response, "create sign-in token")
            .await?
            .json()
            .await?;
        Ok(token.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_keep_custom_fields() {
        let claims: IdentityClaims = serde_json::from_value(serde_json::json!({
            "sub": "user_2zH",
            "exp": 1_700_000_000,
            "customerID": "0b8f3c1e-5a43-4c7e-9a59-3f0d2b1c4e11",
            "role": "owner",
        }))
        .unwrap();

        assert_eq!(claims.subject, "user_2zH");
        assert_eq!(claims.custom_str("role"), Some("owner"));
        assert_eq!(claims.custom_str("userName"), None);
        assert!(claims.custom.contains_key("exp"));
    }
}
