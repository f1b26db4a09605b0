use crate::query::QueryKind;
use crate::schema::ValidationErrors;
use thiserror::Error;
use uuid::Uuid;

/// Central error type for the classroom data access core
#[derive(Error, Debug)]
pub enum ClassroomError {
    // ============================================================================
    // Record Errors
    // ============================================================================
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("No {collection} record with id {id}")]
    RecordNotFound { collection: &'static str, id: Uuid },

    // ============================================================================
    // Dispatch Errors
    // ============================================================================
    #[error("No handler registered for query {0}")]
    UnregisteredQuery(QueryKind),

    #[error("Handler registry is incomplete, missing: {0}")]
    IncompleteRegistry(String),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Failed to create directory: {0}")]
    DirectoryCreationFailed(String),

    #[error("Failed to save to storage: {0}")]
    StorageSaveFailed(String),

    #[error("Failed to delete from storage: {0}")]
    StorageDeleteFailed(String),

    // ============================================================================
    // Generic/System Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock poisoned")]
    LockError,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// Implement conversion from PoisonError for RwLock/Mutex guards
impl<T> From<std::sync::PoisonError<T>> for ClassroomError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        ClassroomError::LockError
    }
}

impl From<ValidationErrors> for ClassroomError {
    fn from(errors: ValidationErrors) -> Self {
        ClassroomError::Validation(errors)
    }
}

impl ClassroomError {
    /// Field-level detail when this is a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ClassroomError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

// Helper type alias for Results
pub type ClassroomResult<T> = Result<T, ClassroomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClassroomError::UnregisteredQuery(QueryKind::StudentById);
        assert_eq!(err.to_string(), "No handler registered for query StudentById");
    }

    #[test]
    fn test_record_not_found_names_collection() {
        let id = Uuid::nil();
        let err = ClassroomError::RecordNotFound {
            collection: "students",
            id,
        };
        assert!(err.to_string().contains("students"));
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ClassroomError = io_err.into();
        assert!(matches!(err, ClassroomError::Io(_)));
    }

    #[test]
    fn test_validation_errors_accessor() {
        let mut errors = ValidationErrors::new();
        errors.add("username", "is required");
        let err: ClassroomError = errors.into();
        let detail = err.validation_errors().unwrap();
        assert_eq!(detail.get("username"), Some("is required"));
    }
}
