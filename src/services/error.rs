use std::collections::HashMap;

use thiserror::Error;

use crate::database::DatabaseError;
use crate::filter::FilterError;

pub const PRODUCT_NOT_FOUND: &str = "product not found";
pub const FORBIDDEN_RESOURCE: &str = "you are not permitted to access this resource";

/// Failure kinds surfaced by the product services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    /// Detail is for logs only; callers see a generic message
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn product_not_found() -> Self {
        ServiceError::NotFound(PRODUCT_NOT_FOUND.to_string())
    }

    pub fn forbidden() -> Self {
        ServiceError::Forbidden(FORBIDDEN_RESOURCE.to_string())
    }

    pub fn validation(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        ServiceError::Validation { message: message.into(), field_errors }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ForeignKeyViolation(constraint) => {
                let mut field_errors = HashMap::new();
                let field = if constraint.contains("category") { "category_id" } else { "shop_id" };
                field_errors.insert(field.to_string(), "Referenced record does not exist".to_string());
                ServiceError::validation("Invalid reference", field_errors)
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<FilterError> for ServiceError {
    fn from(err: FilterError) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(err.field().to_string(), err.to_string());
        ServiceError::validation("Invalid filter", field_errors)
    }
}
