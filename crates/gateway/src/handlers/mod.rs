//! API handlers module

pub mod documents;
pub mod expand;
pub mod health;
pub mod query;

use hydradoc_common::errors::AppError;
use validator::ValidationErrors;

/// First offending field and all messages of a failed validation
pub(crate) fn validation_error(errors: ValidationErrors) -> AppError {
    let field = errors.field_errors().keys().min().map(|f| f.to_string());
    AppError::Validation {
        message: errors.to_string(),
        field,
    }
}
