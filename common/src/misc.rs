use rand::{RngCore, rngs::OsRng};
use uuid::Uuid;

use crate::error::{ErrorCode, FieldError, GraphQLError, Res};

/// Length in bytes of the random part of an emailed verification token.
pub const VERIFICATION_SECRET_BYTES: usize = 18;

/// Hex encoded random string built from `length` bytes of OS randomness.
pub fn generate_token(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// First label of the email's domain, e.g. `jane@acme.co.uk` -> `acme`.
/// Returns an empty string when the address has no single `@`.
pub fn domain_from_email(email: &str) -> String {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return String::new();
    }
    parts[1].split('.').next().unwrap_or_default().to_string()
}

/// Parses a client supplied UID, reporting failures against `field`.
pub fn parse_uid(field: &str, value: &str) -> Res<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        GraphQLError::inline(
            ErrorCode::ValidationError,
            vec![FieldError::new(field, "Must be a valid UID")],
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_hex_of_requested_length() {
        let token = generate_token(VERIFICATION_SECRET_BYTES);
        assert_eq!(token.len(), VERIFICATION_SECRET_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token(VERIFICATION_SECRET_BYTES));
    }

    #[test]
    fn domain_is_first_label() {
        assert_eq!(domain_from_email("jane@acme.io"), "acme");
        assert_eq!(domain_from_email("jane@acme.co.uk"), "acme");
        assert_eq!(domain_from_email("jane@localhost"), "localhost");
        assert_eq!(domain_from_email("not-an-email"), "");
        assert_eq!(domain_from_email("a@b@c.com"), "");
    }

    #[test]
    fn uid_errors_name_the_field() {
        let uid = Uuid::new_v4();
        assert_eq!(parse_uid("departmentUID", &uid.to_string()).unwrap(), uid);

        let Err(crate::error::AppError::GraphQL(shape)) = parse_uid("departmentUID", "sales") else {
            panic!("expected a structured error");
        };
        assert_eq!(shape.fields, vec![FieldError::new("departmentUID", "Must be a valid UID")]);
    }
}
