//! Error types for inventaire.
//!
//! Every failure the inventory can hit is represented here. None of them is
//! fatal: the controller converts each one into a user-visible
//! [`Notification`](crate::notify::Notification) at the operation boundary.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for inventaire operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Persisted slot errors ===
    /// The persisted slot could not be read from the store.
    #[error("failed to read slot '{key}': {message}")]
    StorageRead {
        /// Key of the slot.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The persisted slot holds data that is not a product list.
    #[error("slot '{key}' holds corrupt data: {source}")]
    StorageCorrupt {
        /// Key of the slot.
        key: String,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The store rejected a write to the persisted slot.
    #[error("failed to write slot '{key}': {message}")]
    StorageWrite {
        /// Key of the slot.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Database Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Import / export Errors ===
    /// A CSV file could not be imported.
    #[error("failed to import CSV: {message}")]
    ImportParse {
        /// Description of what went wrong.
        message: String,
    },

    /// A backup snapshot could not be produced.
    #[error("failed to create backup: {message}")]
    BackupCreation {
        /// Description of what went wrong.
        message: String,
    },

    /// A backup file is not a valid backup envelope.
    #[error("invalid backup file: {message}")]
    BackupFormat {
        /// Description of what went wrong.
        message: String,
    },

    // === Input Errors ===
    /// Draft fields submitted to add/update failed validation.
    #[error("invalid {field}: {message}")]
    InvalidDraft {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the validation failure.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A specialized Result type for inventaire operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a slot read error.
    #[must_use]
    pub fn storage_read(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageRead {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a slot write error.
    #[must_use]
    pub fn storage_write(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageWrite {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a CSV import error.
    #[must_use]
    pub fn import_parse(message: impl Into<String>) -> Self {
        Self::ImportParse {
            message: message.into(),
        }
    }

    /// Create a backup creation error.
    #[must_use]
    pub fn backup_creation(message: impl Into<String>) -> Self {
        Self::BackupCreation {
            message: message.into(),
        }
    }

    /// Create an invalid draft error for the given field.
    #[must_use]
    pub fn invalid_draft(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidDraft {
            field,
            message: message.into(),
        }
    }

    /// Check if this error concerns reading or decoding the persisted slot.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::StorageRead { .. } | Self::StorageCorrupt { .. })
    }

    /// Check if this error means in-memory changes were not made durable.
    #[must_use]
    pub fn is_write_error(&self) -> bool {
        matches!(self, Self::StorageWrite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::storage_write("inventory_v1", "disk full");
        assert_eq!(
            err.to_string(),
            "failed to write slot 'inventory_v1': disk full"
        );

        let err = Error::import_parse("empty file");
        assert_eq!(err.to_string(), "failed to import CSV: empty file");
    }

    #[test]
    fn test_error_is_load_error() {
        assert!(Error::storage_read("k", "boom").is_load_error());

        let json_err = serde_json::from_str::<i32>("nope").unwrap_err();
        let err = Error::StorageCorrupt {
            key: "k".to_string(),
            source: json_err,
        };
        assert!(err.is_load_error());
        assert!(!Error::storage_write("k", "boom").is_load_error());
    }

    #[test]
    fn test_error_is_write_error() {
        assert!(Error::storage_write("k", "quota exceeded").is_write_error());
        assert!(!Error::import_parse("bad").is_write_error());
    }

    #[test]
    fn test_invalid_draft_display() {
        let err = Error::invalid_draft("price", "must not be negative");
        assert_eq!(err.to_string(), "invalid price: must not be negative");
    }

    #[test]
    fn test_backup_creation_error() {
        let err = Error::backup_creation("serialization failed");
        assert!(err.to_string().contains("serialization failed"));
    }

    #[test]
    fn test_storage_corrupt_display() {
        let json_err = serde_json::from_str::<Vec<i32>>("{").unwrap_err();
        let err = Error::StorageCorrupt {
            key: "inventory_v1".to_string(),
            source: json_err,
        };
        assert!(err.to_string().contains("inventory_v1"));
        assert!(err.to_string().contains("corrupt"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "slot_key must not be empty".to_string(),
        };
        assert!(err.to_string().contains("slot_key"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
