//! Persistence service.
//!
//! The whole product collection is the unit of persistence: it is stored as
//! one JSON array in a single slot and rewritten in full on every save.
//! Backups wrap the collection in a versioned envelope and never touch the
//! slot.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::product::{self, Product, StoredProduct};
use crate::storage::SlotStore;

/// Slot key holding the product collection.
pub const DEFAULT_SLOT_KEY: &str = "inventory_v1";

/// Format version written into backup envelopes.
pub const BACKUP_VERSION: &str = "1.0";

/// Versioned wrapper written to backup files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupEnvelope {
    /// Backup format version.
    pub version: String,
    /// ISO-8601 time the backup was taken.
    pub timestamp: String,
    /// The product collection at that time.
    pub data: Vec<Product>,
}

/// A backup envelope as read from disk, before its records are repaired.
#[derive(Deserialize)]
struct StoredEnvelope {
    version: String,
    timestamp: String,
    data: Vec<StoredProduct>,
}

impl BackupEnvelope {
    /// Wrap `products` in an envelope stamped with `timestamp`.
    #[must_use]
    pub fn new(products: &[Product], timestamp: DateTime<Utc>) -> Self {
        Self {
            version: BACKUP_VERSION.to_string(),
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            data: products.to_vec(),
        }
    }
}

/// Loads and saves the product collection through a [`SlotStore`].
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
    key: String,
}

impl<S: SlotStore> Persistence<S> {
    /// Bind `store` to the slot named `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The slot key in use.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the persisted collection.
    ///
    /// An absent slot yields an empty collection.
    /// Records with fractional or repeated ids are given fresh ids and
    /// fractional quantities are truncated, so older slots load intact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageRead`] if the store cannot be read and
    /// [`Error::StorageCorrupt`] if the slot does not hold a product list.
    pub fn load(&self) -> Result<Vec<Product>> {
        let Some(raw) = self.store.read(&self.key)? else {
            debug!("Slot {} is empty", self.key);
            return Ok(Vec::new());
        };

        let stored: Vec<StoredProduct> =
            serde_json::from_str(&raw).map_err(|source| Error::StorageCorrupt {
                key: self.key.clone(),
                source,
            })?;

        let restored = product::from_stored(stored);
        if restored.reassigned_ids > 0 {
            warn!(
                "Slot {}: gave fresh ids to {} records",
                self.key, restored.reassigned_ids
            );
        }
        Ok(restored.products)
    }

    /// Read the persisted collection, degrading to empty on any failure.
    pub fn load_or_empty(&self) -> Vec<Product> {
        match self.load() {
            Ok(products) => products,
            Err(e) if e.is_load_error() => {
                warn!("Starting with an empty inventory: {}", e);
                Vec::new()
            }
            Err(e) => {
                error!("Starting with an empty inventory after an unexpected failure: {}", e);
                Vec::new()
            }
        }
    }

    /// Overwrite the slot with `products`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the collection cannot be
    /// serialized or the store rejects the write.
    pub fn save(&mut self, products: &[Product]) -> Result<()> {
        let json = serde_json::to_string(products)
            .map_err(|e| Error::storage_write(&self.key, e.to_string()))?;
        self.store.write(&self.key, &json)?;
        debug!("Saved {} products to slot {}", products.len(), self.key);
        Ok(())
    }
}

/// Serialize `products` into an indented JSON backup document.
///
/// # Errors
///
/// Returns [`Error::BackupCreation`] if serialization fails.
pub fn create_backup_blob(products: &[Product], timestamp: DateTime<Utc>) -> Result<Vec<u8>> {
    let envelope = BackupEnvelope::new(products, timestamp);
    serde_json::to_vec_pretty(&envelope).map_err(|e| Error::backup_creation(e.to_string()))
}

/// File name for a backup taken at `timestamp`.
#[must_use]
pub fn backup_file_name(timestamp: DateTime<Utc>) -> String {
    format!("inventaire_backup_{}.json", timestamp.format("%Y-%m-%d"))
}

/// Decode a backup document.
///
/// Records are repaired the same way as when loading the slot.
///
/// # Errors
///
/// Returns [`Error::BackupFormat`] if `bytes` is not a backup envelope or
/// was written by an incompatible format version.
pub fn read_backup(bytes: &[u8]) -> Result<BackupEnvelope> {
    let envelope: StoredEnvelope =
        serde_json::from_slice(bytes).map_err(|e| Error::BackupFormat {
            message: e.to_string(),
        })?;

    let major = BACKUP_VERSION.split('.').next().unwrap_or(BACKUP_VERSION);
    if envelope.version.split('.').next() != Some(major) {
        return Err(Error::BackupFormat {
            message: format!("unsupported backup version {}", envelope.version),
        });
    }

    if DateTime::parse_from_rfc3339(&envelope.timestamp).is_err() {
        return Err(Error::BackupFormat {
            message: format!("invalid timestamp {}", envelope.timestamp),
        });
    }

    Ok(BackupEnvelope {
        version: envelope.version,
        timestamp: envelope.timestamp,
        data: product::from_stored(envelope.data).products,
    })
}
