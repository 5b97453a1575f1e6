//! Service-level errors.
//!
//! These carry no transport detail; the RPC layer maps them onto wire codes.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No todo with id '{id}'")]
    NotFound { id: String },

    #[error("A todo with id '{id}' already exists")]
    Conflict { id: String },

    /// Anything else the store reported. The message is logged, not returned.
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => ServiceError::NotFound { id },
            StoreError::Conflict { id } => ServiceError::Conflict { id },
            other => ServiceError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_id() {
        let err = ServiceError::NotFound { id: "abc".to_string() };
        assert_eq!(err.to_string(), "No todo with id 'abc'");
    }

    #[test]
    fn store_not_found_and_conflict_keep_their_kind() {
        let err = ServiceError::from(StoreError::NotFound { id: "a".to_string() });
        assert!(matches!(err, ServiceError::NotFound { id } if id == "a"));

        let err = ServiceError::from(StoreError::Conflict { id: "b".to_string() });
        assert!(matches!(err, ServiceError::Conflict { id } if id == "b"));
    }

    #[test]
    fn other_store_errors_become_storage() {
        let err = ServiceError::from(StoreError::CorruptRow {
            id: "c".to_string(),
            reason: "bad".to_string(),
        });
        assert!(matches!(err, ServiceError::Storage(_)));
    }
}
