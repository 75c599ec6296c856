use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid ID format: {message}")]
    InvalidId { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Document '42' not found");
        assert_eq!(error.to_string(), "Not found: Document '42' not found");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Body must be a JSON object");
        assert_eq!(
            error.to_string(),
            "Validation error: Body must be a JSON object"
        );
    }

    #[test]
    fn test_storage_error() {
        let error = DomainError::storage("connection lost");
        assert_eq!(error.to_string(), "Storage error: connection lost");
    }
}
