//! `inventaire` - CLI for the inventory tracker
//!
//! This binary is the presentation layer: it turns commands into inventory
//! operations and prints the resulting products, totals and notifications.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use inventaire::cli::{
    AddCommand, BackupCommand, Cli, Command, ConfigCommand, DeleteCommand, EditCommand,
    ExportCommand, ImportCommand, InventoryCommand, OutputFormat, RestoreCommand, StatsCommand,
};
use inventaire::codec::EXPORT_FILE_NAME;
use inventaire::notify::messages;
use inventaire::persistence::{backup_file_name, read_backup};
use inventaire::{
    init_logging, Config, Error, Inventory, Notification, Persistence, Product, Storage,
};

type App = Inventory<Storage>;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    let command = match cli.command {
        Command::Config(config_cmd) => {
            handle_config(&config, config_cmd)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Inventory(command) => command,
    };

    let database_path = config.database_path();
    let storage = Storage::open(&database_path)
        .with_context(|| format!("opening inventory at {}", database_path.display()))?;
    let persistence = Persistence::new(storage, config.storage.slot_key.clone());
    let mut inventory = Inventory::open(persistence, config.display.date_format.clone());

    let notification = match command {
        InventoryCommand::List(cmd) => {
            print_products(inventory.products().iter(), cmd.format, &config)?;
            None
        }
        InventoryCommand::Search(cmd) => {
            let term = cmd.term.as_deref().unwrap_or_default();
            print_products(inventory.search(term).into_iter(), cmd.format, &config)?;
            None
        }
        InventoryCommand::Stats(cmd) => {
            handle_stats(&inventory, &cmd, &config)?;
            None
        }
        InventoryCommand::Add(cmd) => Some(handle_add(&mut inventory, &cmd)),
        InventoryCommand::Edit(cmd) => Some(handle_edit(&mut inventory, &cmd)),
        InventoryCommand::Delete(cmd) => Some(handle_delete(&mut inventory, &cmd)?),
        InventoryCommand::Import(cmd) => Some(handle_import(&mut inventory, &cmd)),
        InventoryCommand::Export(cmd) => Some(handle_export(&inventory, cmd, &config)),
        InventoryCommand::Backup(cmd) => Some(handle_backup(&inventory, cmd, &config)),
        InventoryCommand::Restore(cmd) => Some(handle_restore(&mut inventory, &cmd)),
    };

    match notification {
        Some(n) if n.is_error() => {
            eprintln!("{n}");
            Ok(ExitCode::FAILURE)
        }
        Some(n) => {
            println!("{n}");
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

/// Turn an operation outcome into the notification shown to the user.
fn notify<T>(
    result: inventaire::Result<T>,
    on_success: impl FnOnce(T) -> Notification,
) -> Notification {
    match result {
        Ok(value) => on_success(value),
        Err(e) => Notification::from_error(&e),
    }
}

fn not_found(id: u64) -> Notification {
    Notification::error(format!("{} (id {id})", messages::NOT_FOUND))
}

fn handle_add(inventory: &mut App, cmd: &AddCommand) -> Notification {
    notify(inventory.add(cmd.draft()), |product| {
        Notification::success(format!("{} (id {})", messages::ADDED, product.id))
    })
}

fn handle_edit(inventory: &mut App, cmd: &EditCommand) -> Notification {
    let Some(current) = inventory.get(cmd.id) else {
        return not_found(cmd.id);
    };
    let draft = cmd.draft(current);

    notify(inventory.update(cmd.id, draft), |updated| match updated {
        Some(_) => Notification::success(messages::UPDATED),
        None => not_found(cmd.id),
    })
}

fn handle_delete(inventory: &mut App, cmd: &DeleteCommand) -> io::Result<Notification> {
    let Some(product) = inventory.get(cmd.id) else {
        return Ok(not_found(cmd.id));
    };

    if !cmd.yes {
        let prompt = format!(
            "Êtes-vous sûr de vouloir supprimer « {} » ?",
            product.name
        );
        if !confirm(&prompt)? {
            return Ok(Notification::success(messages::DELETE_CANCELLED));
        }
    }

    Ok(notify(inventory.delete(cmd.id), |deleted| {
        if deleted {
            Notification::success(messages::DELETED)
        } else {
            not_found(cmd.id)
        }
    }))
}

fn handle_import(inventory: &mut App, cmd: &ImportCommand) -> Notification {
    let result = std::fs::read_to_string(&cmd.file)
        .map_err(|e| Error::import_parse(format!("{}: {e}", cmd.file.display())))
        .and_then(|text| inventory.import_csv(&text));

    notify(result, |count| {
        Notification::success(format!("{} ({count} produits)", messages::IMPORTED))
    })
}

fn handle_export(inventory: &App, cmd: ExportCommand, config: &Config) -> Notification {
    let path = cmd
        .output
        .unwrap_or_else(|| config.output_dir().join(EXPORT_FILE_NAME));

    let result = inventory
        .export_csv()
        .and_then(|csv| std::fs::write(&path, csv).map_err(Error::from));

    notify(result, |()| {
        Notification::success(format!("{} ({})", messages::EXPORTED, path.display()))
    })
}

fn handle_backup(inventory: &App, cmd: BackupCommand, config: &Config) -> Notification {
    let now = Utc::now();
    let dir = cmd.output_dir.unwrap_or_else(|| config.output_dir());
    let path = dir.join(backup_file_name(now));

    let result = inventory.backup(now).and_then(|blob| {
        std::fs::write(&path, blob)
            .map_err(|e| Error::backup_creation(format!("{}: {e}", path.display())))
    });

    notify(result, |()| {
        Notification::success(format!("{} ({})", messages::BACKED_UP, path.display()))
    })
}

fn handle_restore(inventory: &mut App, cmd: &RestoreCommand) -> Notification {
    let result = std::fs::read(&cmd.file)
        .map_err(Error::from)
        .and_then(|bytes| read_backup(&bytes))
        .and_then(|envelope| inventory.restore(envelope));

    notify(result, |count| {
        Notification::success(format!("{} ({count} produits)", messages::RESTORED))
    })
}

fn handle_stats(inventory: &App, cmd: &StatsCommand, config: &Config) -> anyhow::Result<()> {
    let totals = inventory.totals();
    let currency = &config.display.currency;
    let storage = inventory.persistence().store();
    let usage = storage.stats().context("reading database statistics")?;
    let last_write = usage.last_write.map(|t| t.to_rfc3339());

    if cmd.json {
        let stats = serde_json::json!({
            "total_products": totals.total_products,
            "total_items": totals.total_items,
            "total_value": totals.total_value,
            "currency": currency,
            "database": {
                "path": storage.path().display().to_string(),
                "slot_count": usage.slot_count,
                "size_bytes": usage.db_size_bytes,
                "last_write": last_write,
            },
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Produits uniques:  {}", totals.total_products);
        println!("Articles totaux:   {}", totals.total_items);
        println!("Valeur totale:     {:.2} {currency}", totals.total_value);
        println!();
        println!("Base de données:   {}", storage.path().display());
        println!("Emplacements:      {}", usage.slot_count);
        println!("Taille:            {} octets", usage.db_size_bytes);
        println!(
            "Dernière écriture: {}",
            last_write.as_deref().unwrap_or("jamais")
        );
    }
    Ok(())
}

fn print_products<'a>(
    products: impl Iterator<Item = &'a Product>,
    format: OutputFormat,
    config: &Config,
) -> anyhow::Result<()> {
    let products: Vec<&Product> = products.collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    if products.is_empty() {
        println!("Aucun produit trouvé. Commencez par en ajouter un nouveau.");
        return Ok(());
    }

    println!(
        "{:<15} {:<24} {:<18} {:>9} {:>12} {:<12}",
        "ID", "NOM", "CATÉGORIE", "QUANTITÉ", "PRIX", "DERNIÈRE MAJ"
    );
    for p in products {
        println!(
            "{:<15} {:<24} {:<18} {:>9} {:>12} {:<12}",
            p.id,
            p.name,
            p.category,
            p.quantity,
            format!("{:.2} {}", p.price, config.display.currency),
            p.last_updated
        );
    }
    Ok(())
}

/// Ask a yes/no question on stdin. Anything but an explicit yes is a no.
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt} [o/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "o" | "oui" | "y" | "yes"
    ))
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!("  Slot key:       {}", config.storage.slot_key);
                println!();
                println!("[Display]");
                println!("  Date format:    {}", config.display.date_format);
                println!("  Currency:       {}", config.display.currency);
                println!();
                println!("[Export]");
                println!("  Output dir:     {}", config.output_dir().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            validate_config_file(&path);
        }
    }
    Ok(())
}

fn validate_config_file(path: &Path) {
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path.to_path_buf())) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}
