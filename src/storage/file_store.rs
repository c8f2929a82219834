use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::storage::key_value::{validate_key, KeyValueStore, StorageError};

/// One `<key>.json` file per record inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the directory if it doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            debug!("Created storage directory {}", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        let mut file = fs::File::create(&path)?;
        file.write_all(value.as_bytes())?;
        file.flush()?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = file.metadata()?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        debug!("Stored record '{}'", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed record '{}'", key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_and_missing_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested")).unwrap();

        assert!(store.get("session").unwrap().is_none());
        store.set("session", r#"{"username":"amy"}"#).unwrap();
        assert_eq!(
            store.get("session").unwrap().as_deref(),
            Some(r#"{"username":"amy"}"#)
        );

        store.remove("session").unwrap();
        store.remove("session").unwrap();
        assert!(store.get("session").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_records_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();
        store.set("cart.office.guest", "[]").unwrap();

        let mode = fs::metadata(temp_dir.path().join("cart.office.guest.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
