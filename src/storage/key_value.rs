use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Persistence port for small string records (cart, session).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a key that does not exist is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys double as file names in `FileStore`, so keep them to a safe alphabet.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("cart.office.guest").is_ok());
        assert!(validate_key("session").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../secrets").is_err());
        assert!(validate_key("cart/office").is_err());
        assert!(validate_key(".hidden").is_err());
    }
}
