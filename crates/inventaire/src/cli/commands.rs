//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::product::{Product, ProductDraft, ProductId};

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Product name
    #[arg(short, long)]
    pub name: String,

    /// Product category
    #[arg(long)]
    pub category: String,

    /// Quantity on hand
    #[arg(long, default_value = "0")]
    pub quantity: u32,

    /// Unit price
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    pub price: f64,
}

impl AddCommand {
    /// The draft fields given on the command line.
    #[must_use]
    pub fn draft(&self) -> ProductDraft {
        ProductDraft::new(&self.name, &self.category, self.quantity, self.price)
    }
}

/// Edit command arguments.
///
/// Fields left out keep their current value.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Id of the product to edit
    pub id: ProductId,

    /// New product name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New product category
    #[arg(long)]
    pub category: Option<String>,

    /// New quantity on hand
    #[arg(long)]
    pub quantity: Option<u32>,

    /// New unit price
    #[arg(short, long, allow_negative_numbers = true)]
    pub price: Option<f64>,
}

impl EditCommand {
    /// Merge the given fields over `current`.
    #[must_use]
    pub fn draft(&self, current: &Product) -> ProductDraft {
        let mut draft = current.to_draft();
        if let Some(name) = &self.name {
            draft.name.clone_from(name);
        }
        if let Some(category) = &self.category {
            draft.category.clone_from(category);
        }
        if let Some(quantity) = self.quantity {
            draft.quantity = quantity;
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        draft
    }
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Id of the product to delete
    pub id: ProductId,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in names and categories (omit to list everything)
    pub term: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// CSV file to import
    pub file: PathBuf,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Destination file (defaults to inventaire.csv in the export directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Backup command arguments.
#[derive(Debug, Args)]
pub struct BackupCommand {
    /// Directory to write the backup into
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Restore command arguments.
#[derive(Debug, Args)]
pub struct RestoreCommand {
    /// Backup file to restore from
    pub file: PathBuf,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> Product {
        Product {
            id: 7,
            name: "Marteau".to_string(),
            category: "Outils".to_string(),
            quantity: 2,
            price: 10.0,
            last_updated: "01/01/2024".to_string(),
        }
    }

    #[test]
    fn test_add_command_draft() {
        let cmd = AddCommand {
            name: "Vis".to_string(),
            category: "Quincaillerie".to_string(),
            quantity: 100,
            price: 0.1,
        };
        assert_eq!(cmd.draft(), ProductDraft::new("Vis", "Quincaillerie", 100, 0.1));
    }

    #[test]
    fn test_edit_command_keeps_unspecified_fields() {
        let cmd = EditCommand {
            id: 7,
            name: None,
            category: None,
            quantity: Some(5),
            price: None,
        };
        let draft = cmd.draft(&current());
        assert_eq!(draft, ProductDraft::new("Marteau", "Outils", 5, 10.0));
    }

    #[test]
    fn test_edit_command_replaces_all_fields() {
        let cmd = EditCommand {
            id: 7,
            name: Some("Maillet".to_string()),
            category: Some("Menuiserie".to_string()),
            quantity: Some(1),
            price: Some(8.5),
        };
        let draft = cmd.draft(&current());
        assert_eq!(draft, ProductDraft::new("Maillet", "Menuiserie", 1, 8.5));
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }
}
