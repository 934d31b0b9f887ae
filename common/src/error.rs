use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub type Res<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    JWT(#[from] jsonwebtoken::errors::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === APPLICATION ERRORS ===
    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    BadRequest(String),

    #[error("Resource conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),

    #[error("{}", .0.message)]
    GraphQL(Box<GraphQLError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthenticationError,
    AuthorizationError,
    ValidationError,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    Conflict,
    InternalError,
}

/// How the client is expected to render an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    Inline,
    Global,
    Toast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Structured error shape understood by the client.
///
/// Anything raised as a `GraphQLError` is surfaced verbatim by the error
/// normalizer; everything else is wrapped as a generic internal error.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQLError {
    pub message: String,
    pub code: ErrorCode,
    pub error_type: ErrorType,
    pub user_error: bool,
    pub user_presentable_message: Option<String>,
    pub fields: Vec<FieldError>,
    pub meta: Option<Map<String, Value>>,
}

impl GraphQLError {
    /// Field-level validation failure rendered next to the offending inputs.
    pub fn inline(code: ErrorCode, fields: Vec<FieldError>) -> Self {
        GraphQLError {
            message: "Validation failed".to_string(),
            code,
            error_type: ErrorType::Inline,
            user_error: true,
            user_presentable_message: None,
            fields,
            meta: None,
        }
    }

    pub fn global(code: ErrorCode, message: impl Into<String>) -> Self {
        GraphQLError {
            message: message.into(),
            code,
            error_type: ErrorType::Global,
            user_error: true,
            user_presentable_message: None,
            fields: Vec::new(),
            meta: None,
        }
    }

    pub fn toast(code: ErrorCode, message: impl Into<String>, user_message: impl Into<String>) -> Self {
        GraphQLError {
            message: message.into(),
            code,
            error_type: ErrorType::Toast,
            user_error: true,
            user_presentable_message: Some(user_message.into()),
            fields: Vec::new(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }
}

impl From<GraphQLError> for AppError {
    fn from(error: GraphQLError) -> Self {
        AppError::GraphQL(Box::new(error))
    }
}

impl AppError {
    /// Returns the structured shape of this error, if it carries one.
    ///
    /// Application variants map onto a GLOBAL error of their category;
    /// conversion variants and `Internal` have no client-facing shape.
    pub fn as_graphql_error(&self) -> Option<GraphQLError> {
        let code = match self {
            AppError::GraphQL(error) => return Some((**error).clone()),
            AppError::Unauthorized(_) => ErrorCode::AuthenticationError,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::BadRequest(_) => ErrorCode::ValidationError,
            AppError::Conflict(_) => ErrorCode::Conflict,
            _ => return None,
        };
        Some(GraphQLError::global(code, self.to_string()))
    }

    pub fn to_http_response(&self) -> HttpResponse {
        let is_dev = cfg!(debug_assertions);

        let to_internal_json = |err_msg: &str| {
            if is_dev {
                serde_json::json!({ "error": err_msg })
            } else {
                serde_json::json!({ "error": "Internal server error" })
            }
        };

        match self {
            // === CONVERSION ERRORS ===
            AppError::Database(error) => {
                log::error!("Database error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::JWT(error) => {
                log::error!("JWT error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Reqwest(error) => {
                log::error!("Reqwest error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Json(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": self.to_string() }))
            }

            // === APPLICATION ERRORS ===
            AppError::Unauthorized(_) => {
                HttpResponse::Unauthorized().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::NotFound(_) => {
                HttpResponse::NotFound().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::BadRequest(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::Conflict(_) => {
                HttpResponse::Conflict().json(serde_json::json!({ "error": self.to_string() }))
            }
            AppError::GraphQL(error) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": error.message }))
            }

            AppError::Internal(error) => {
                log::error!("Internal error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(error))
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}
