//! Command-line interface for inventaire.
//!
//! This module provides the CLI structure for the `inventaire` binary, the
//! presentation layer over [`Inventory`](crate::Inventory).

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, BackupCommand, ConfigCommand, DeleteCommand, EditCommand, ExportCommand,
    ImportCommand, ListCommand, OutputFormat, RestoreCommand, SearchCommand, StatsCommand,
};

/// inventaire - Keep track of your stock
///
/// Records products with their category, quantity and price, and moves
/// them in and out of CSV files and JSON backups.
#[derive(Debug, Parser)]
#[command(name = "inventaire")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Commands that work on the stored inventory.
    #[command(flatten)]
    Inventory(InventoryCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Commands that open the inventory database.
#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    /// List all products
    List(ListCommand),

    /// Add a new product
    Add(AddCommand),

    /// Edit an existing product
    Edit(EditCommand),

    /// Delete a product
    Delete(DeleteCommand),

    /// Search products by name or category
    Search(SearchCommand),

    /// Show inventory totals and database usage
    Stats(StatsCommand),

    /// Import products from a CSV file
    Import(ImportCommand),

    /// Export products to a CSV file
    Export(ExportCommand),

    /// Write a JSON backup of the inventory
    Backup(BackupCommand),

    /// Add the products of a JSON backup to the inventory
    Restore(RestoreCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
