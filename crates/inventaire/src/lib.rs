//! `inventaire` - A single-user inventory tracker
//!
//! This library keeps a list of products in a local `SQLite` slot, supports
//! searching and editing it, and moves it in and out of CSV files and JSON
//! backups.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod notify;
pub mod persistence;
pub mod product;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use inventory::{Inventory, Totals};
pub use logging::init_logging;
pub use notify::{Notification, Severity};
pub use persistence::{BackupEnvelope, Persistence};
pub use product::{Product, ProductDraft, ProductId};
pub use storage::{SlotStore, Storage, StorageStats};
