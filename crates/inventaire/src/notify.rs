//! User-visible notifications.
//!
//! Every operation ends in exactly one notification: a success message, or
//! the error converted at the operation boundary. Messages are French, like
//! the CSV export header.

use std::fmt;

use serde::Serialize;

use crate::error::Error;

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The operation completed.
    Success,
    /// The operation failed; the application keeps running.
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Text shown to the user.
    pub message: String,
    /// Presentation severity.
    pub severity: Severity,
}

/// Success messages for each user action.
pub mod messages {
    /// Product added.
    pub const ADDED: &str = "Produit ajouté avec succès";
    /// Product updated.
    pub const UPDATED: &str = "Produit mis à jour avec succès";
    /// Product deleted.
    pub const DELETED: &str = "Produit supprimé avec succès";
    /// CSV import finished.
    pub const IMPORTED: &str = "Importation réussie";
    /// CSV export finished.
    pub const EXPORTED: &str = "Exportation réussie";
    /// Backup file written.
    pub const BACKED_UP: &str = "Sauvegarde créée avec succès";
    /// Backup restored.
    pub const RESTORED: &str = "Sauvegarde restaurée avec succès";
    /// No product with the requested id.
    pub const NOT_FOUND: &str = "Produit introuvable";
    /// Deletion declined at the confirmation prompt.
    pub const DELETE_CANCELLED: &str = "Suppression annulée";
}

impl Notification {
    /// A success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    /// An error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Convert an operation failure into the message shown to the user.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        let headline = match err {
            _ if err.is_load_error() => "Erreur lors du chargement des données",
            _ if err.is_write_error() => "Erreur lors de la sauvegarde",
            Error::ImportParse { .. } => "Erreur lors de l'importation du fichier",
            Error::BackupCreation { .. } => "Erreur lors de la création de la sauvegarde",
            Error::BackupFormat { .. } => "Fichier de sauvegarde invalide",
            Error::InvalidDraft { .. } => "Données du produit invalides",
            Error::Csv(_) => "Erreur lors de l'exportation",
            _ => "Erreur inattendue",
        };
        Self::error(format!("{headline} ({err})"))
    }

    /// Whether this notification reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.severity {
            Severity::Success => '✓',
            Severity::Error => '✗',
        };
        write!(f, "{marker} {}", self.message)
    }
}
