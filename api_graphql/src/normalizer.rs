//! Translates operation errors into client-visible GraphQL errors.

use common::{
    error::{AppError, ErrorCode, ErrorType, GraphQLError},
    graphql::GraphQLErrorEntry,
};
use log::error;
use serde_json::{Map, Value, json};

/// Builds the error entry for a failed operation rooted at `root_field`.
///
/// Structured errors keep their code, type and user flags. Anything else is
/// reported as a non-user INTERNAL_ERROR; its message is passed through.
pub fn normalize(err: &AppError, root_field: &str) -> GraphQLErrorEntry {
    let path = if root_field.is_empty() {
        Vec::new()
    } else {
        vec![root_field.to_string()]
    };

    match err.as_graphql_error() {
        Some(shape) => GraphQLErrorEntry {
            message: shape.message.clone(),
            path,
            extensions: structured_extensions(shape),
        },
        None => {
            error!("Unhandled error in {}: {}", root_field, err);
            let mut extensions = Map::new();
            extensions.insert("code".to_string(), json!(ErrorCode::InternalError));
            extensions.insert("type".to_string(), json!(ErrorType::Global));
            extensions.insert("userError".to_string(), Value::Bool(false));
            GraphQLErrorEntry {
                message: err.to_string(),
                path,
                extensions,
            }
        }
    }
}

fn structured_extensions(shape: GraphQLError) -> Map<String, Value> {
    let mut extensions = Map::new();
    extensions.insert("code".to_string(), json!(shape.code));
    extensions.insert("type".to_string(), json!(shape.error_type));
    extensions.insert("userError".to_string(), Value::Bool(shape.user_error));
    extensions.insert(
        "userPresentableMessage".to_string(),
        json!(shape.user_presentable_message),
    );
    if let Some(meta) = shape.meta.filter(|m| !m.is_empty()) {
        extensions.insert("meta".to_string(), Value::Object(meta));
    }
    if !shape.fields.is_empty() {
        extensions.insert("fields".to_string(), json!(shape.fields));
    }
    extensions
}

#[cfg(test)]
mod tests {
    use common::error::FieldError;

    use super::*;

    #[test]
    fn validation_error_keeps_its_fields() {
        let err: AppError = GraphQLError::inline(
            ErrorCode::ValidationError,
            vec![
                FieldError::new("email", "A valid email address is required"),
                FieldError::new("password", "Password is required"),
            ],
        )
        .into();

        let entry = normalize(&err, "signup");
        assert_eq!(entry.path, vec!["signup".to_string()]);
        assert_eq!(entry.extensions["code"], json!("VALIDATION_ERROR"));
        assert_eq!(entry.extensions["type"], json!("INLINE"));
        assert_eq!(entry.extensions["userError"], json!(true));
        assert_eq!(entry.extensions["fields"].as_array().map(Vec::len), Some(2));
        assert!(!entry.extensions.contains_key("meta"));
    }

    #[test]
    fn plain_internal_error_is_wrapped() {
        let entry = normalize(&AppError::Internal("pool timed out".to_string()), "getCustomer");

        assert_eq!(entry.message, "pool timed out");
        assert_eq!(entry.extensions["code"], json!("INTERNAL_ERROR"));
        assert_eq!(entry.extensions["type"], json!("GLOBAL"));
        assert_eq!(entry.extensions["userError"], json!(false));
        assert!(!entry.extensions.contains_key("fields"));
        assert!(!entry.extensions.contains_key("userPresentableMessage"));
    }

    #[test]
    fn application_variants_surface_their_category() {
        let entry = normalize(&AppError::Conflict("bob@acme.io exists".to_string()), "createEmailRecipient");
        assert_eq!(entry.extensions["code"], json!("CONFLICT"));
        assert_eq!(entry.extensions["type"], json!("GLOBAL"));
        assert_eq!(entry.extensions["userError"], json!(true));
    }

    #[test]
    fn meta_is_carried_when_present() {
        let err: AppError = GraphQLError::toast(ErrorCode::Conflict, "taken", "Already invited")
            .with_meta("email", json!("bob@acme.io"))
            .into();

        let entry = normalize(&err, "createEmailRecipient");
        assert_eq!(entry.extensions["meta"], json!({ "email": "bob@acme.io" }));
        assert_eq!(entry.extensions["userPresentableMessage"], json!("Already invited"));
    }
}
