use thiserror::Error;

/// Error taxonomy for all store/catalog operations. Callers are responsible
/// for user-facing messaging; nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("password must be at least {0} characters")]
    WeakCredential(usize),

    #[error("a user with this email already exists")]
    DuplicateUser,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid credentials")]
    InvalidCredential,

    #[error("not authenticated")]
    Unauthenticated,

    /// A persisted blob failed to parse. Recovered locally by discarding the
    /// record and falling back to defaults; surfaced only when that recovery
    /// itself is impossible.
    #[error("stored data corrupt: {0}")]
    StorageCorrupt(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("credential hashing failed: {0}")]
    Hash(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(
            PlatformError::WeakCredential(6).to_string(),
            "password must be at least 6 characters"
        );
        assert_eq!(
            PlatformError::DuplicateUser.to_string(),
            "a user with this email already exists"
        );
        assert_eq!(
            PlatformError::Unauthenticated.to_string(),
            "not authenticated"
        );
    }

    #[test]
    fn storage_errors_convert() {
        let err = rusqlite::Error::QueryReturnedNoRows;
        let platform: PlatformError = err.into();
        assert!(matches!(platform, PlatformError::Storage(_)));
    }
}
