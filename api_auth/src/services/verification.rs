//! One-time account verification tokens.
//!
//! A token is `<customerUID>.<secret>`. Only the secret is stored, on the
//! customer row; re-issuing overwrites it.

use common::{
    error::Res,
    misc::{VERIFICATION_SECRET_BYTES, generate_token},
};
use db::{models::customer::Customer, store::CustomerRepository};
use log::{debug, info};
use subtle::ConstantTimeEq;
use uuid::Uuid;

const SEPARATOR: char = '.';

pub fn compose_token(customer_uid: Uuid, secret: &str) -> String {
    format!("{}{}{}", customer_uid, SEPARATOR, secret)
}

/// Generates a fresh secret for the customer and returns the composite token.
pub async fn issue_token<R>(repo: &mut R, customer_uid: Uuid) -> Res<String>
where
    R: CustomerRepository + ?Sized,
{
    let secret = generate_token(VERIFICATION_SECRET_BYTES);
    repo.update_customer_verification_token(customer_uid, &secret)
        .await?;
    Ok(compose_token(customer_uid, &secret))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub customer: Customer,
    /// The presented secret equals the stored one.
    pub matched: bool,
}

/// Checks a composite token against the stored secret.
///
/// Returns `None` when the token is malformed or names no customer. A wrong
/// secret yields the customer untouched with `matched == false`. A matching
/// secret marks the customer verified; presenting it again keeps it verified.
pub async fn validate_token<R>(repo: &mut R, token: &str) -> Res<Option<Verification>>
where
    R: CustomerRepository + ?Sized,
{
    let parts: Vec<&str> = token.split(SEPARATOR).collect();
    if parts.len() != 2 {
        debug!("Verification token has {} segments", parts.len());
        return Ok(None);
    }

    let Ok(customer_uid) = Uuid::parse_str(parts[0]) else {
        debug!("Verification token carries an invalid customer UID");
        return Ok(None);
    };

    let Some(customer) = repo.get_customer_by_uid(customer_uid).await? else {
        debug!("Verification token names unknown customer {}", customer_uid);
        return Ok(None);
    };

    let matched = customer
        .verification_token
        .as_deref()
        .is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(parts[1].as_bytes())));

    if !matched {
        return Ok(Some(Verification {
            customer,
            matched: false,
        }));
    }

    let customer = if customer.is_verified {
        customer
    } else {
        info!("Customer {} verified", customer_uid);
        repo.set_customer_verified(customer_uid).await?
    };

    Ok(Some(Verification {
        customer,
        matched: true,
    }))
}
