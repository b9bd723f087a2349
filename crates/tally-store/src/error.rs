//! Store error type.

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(String),

    /// Entity not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation (session code already taken).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Filesystem failure while opening the store.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, _) = &e {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                return StoreError::Conflict(e.to_string());
            }
        }
        StoreError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_variants() {
        assert_eq!(
            StoreError::Database("boom".into()).to_string(),
            "database error: boom"
        );
        assert_eq!(
            StoreError::NotFound("session x".into()).to_string(),
            "not found: session x"
        );
        assert_eq!(
            StoreError::Conflict("code".into()).to_string(),
            "conflict: code"
        );
    }

    #[test]
    fn constraint_violation_maps_to_conflict() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("UNIQUE constraint failed: sessions.code".into()),
        );
        assert!(matches!(StoreError::from(err), StoreError::Conflict(_)));
    }

    #[test]
    fn other_sqlite_errors_map_to_database() {
        let err = rusqlite::Error::InvalidQuery;
        assert!(matches!(StoreError::from(err), StoreError::Database(_)));
    }
}
