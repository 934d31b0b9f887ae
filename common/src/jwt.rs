//! Signed invitation tokens.
//!
//! `base64url(header).base64url(payload).base64url(hmac_sha256(header.payload))`,
//! unpadded. Nothing is persisted: a token is valid when its signature checks
//! out and the wall clock is before its expiry.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    env_config::InviteConfig,
    error::{AppError, Res},
};

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        TokenHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InviteClaims {
    #[serde(rename = "departmentUID")]
    pub department_uid: Uuid,
    #[serde(rename = "customerUID")]
    pub customer_uid: Uuid,
    pub is_valid: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl InviteClaims {
    /// Consumer-side validity: the embedded flag must be set and the token
    /// must not have expired at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_valid && now < self.expires_at
    }
}

/// Issues and validates invitation tokens with a process-wide secret.
#[derive(Clone)]
pub struct InviteTokenCodec {
    secret: Vec<u8>,
    ttl: Duration,
}

impl InviteTokenCodec {
    pub fn new(config: &InviteConfig) -> Self {
        InviteTokenCodec {
            secret: config.secret.as_bytes().to_vec(),
            ttl: Duration::hours(config.expiration_hours),
        }
    }

    pub fn issue(&self, department_uid: Uuid, customer_uid: Uuid) -> Res<String> {
        self.issue_at(department_uid, customer_uid, Utc::now())
    }

    pub fn issue_at(
        &self,
        department_uid: Uuid,
        customer_uid: Uuid,
        now: DateTime<Utc>,
    ) -> Res<String> {
        let claims = InviteClaims {
            department_uid,
            customer_uid,
            is_valid: true,
            expires_at: now + self.ttl,
            created_at: now,
        };

        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&TokenHeader::default())?);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let message = format!("{}.{}", header, payload);
        let signature = self.sign(&message)?;

        Ok(format!("{}.{}", message, signature))
    }

    pub fn validate(&self, token: &str) -> Res<InviteClaims> {
        self.validate_at(token, Utc::now())
    }

    /// Checks structure and signature, then decodes the claims.
    ///
    /// An expired token is not an error: its claims come back with
    /// `is_valid` forced to `false`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Res<InviteClaims> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(AppError::BadRequest("invalid token format".to_string()));
        }

        let message = format!("{}.{}", parts[0], parts[1]);
        let expected = self.sign(&message)?;
        if !bool::from(expected.as_bytes().ct_eq(parts[2].as_bytes())) {
            return Err(AppError::BadRequest("invalid token signature".to_string()));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|e| AppError::BadRequest(format!("failed to decode payload: {}", e)))?;
        let mut claims: InviteClaims = serde_json::from_slice(&payload)
            .map_err(|e| AppError::BadRequest(format!("failed to unmarshal claims: {}", e)))?;

        if now > claims.expires_at {
            claims.is_valid = false;
        }

        Ok(claims)
    }

    fn sign(&self, message: &str) -> Res<String> {
        let mut mac = <Hmac<Sha256>>::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(format!("invalid signing key: {}", e)))?;
        mac.update(message.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}
