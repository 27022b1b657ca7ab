//! CSV import and export.
//!
//! Columns are fixed: name, category, quantity, price, last updated. The
//! format has no quoting or escaping in either direction: a comma inside a
//! value splits it into two columns. Round trips are only lossless for
//! values without commas.

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::product::{whole_quantity, Product};

/// Header row written on export.
pub const EXPORT_HEADER: [&str; 5] = ["NOM", "CATÉGORIE", "QUANTITÉ", "PRIX", "DERNIÈRE MAJ"];

/// File name offered for CSV exports.
pub const EXPORT_FILE_NAME: &str = "inventaire.csv";

/// Name used when an imported row has none.
pub const DEFAULT_NAME: &str = "Sans nom";

/// Category used when an imported row has none.
pub const DEFAULT_CATEGORY: &str = "Non catégorisé";

/// One product read from a CSV file, before it is given an id.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRow {
    /// Display name.
    pub name: String,
    /// Free-form category.
    pub category: String,
    /// Count on hand.
    pub quantity: u32,
    /// Unit price.
    pub price: f64,
    /// Display date of the last update.
    pub last_updated: String,
}

impl ImportedRow {
    /// Turn this row into a product with the given id.
    #[must_use]
    pub fn into_product(self, id: u64) -> Product {
        Product {
            id,
            name: self.name,
            category: self.category,
            quantity: self.quantity,
            price: self.price,
            last_updated: self.last_updated,
        }
    }
}

/// Parse CSV text into rows.
///
/// The first non-blank line is the header and is discarded without being
/// checked. Blank lines are skipped and short rows take defaults for the
/// missing columns. `today` fills an empty last-updated column.
///
/// # Errors
///
/// Returns [`Error::ImportParse`] if the text has no header line or cannot
/// be read as CSV.
pub fn parse(text: &str, today: &str) -> Result<Vec<ImportedRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut header_seen = false;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| Error::import_parse(e.to_string()))?;
        if is_blank(&record) {
            continue;
        }
        if !header_seen {
            debug!("Skipping CSV header: {:?}", record);
            header_seen = true;
            continue;
        }

        let line = record.position().map_or(0, csv::Position::line);
        rows.push(row_from_record(&record, today, line));
    }

    if !header_seen {
        return Err(Error::import_parse("file is empty"));
    }

    debug!("Parsed {} CSV rows", rows.len());
    Ok(rows)
}

/// Serialize products to CSV text with the export header.
///
/// Rows are separated by `\n` and the text does not end with a newline.
///
/// # Errors
///
/// Returns an error if the CSV writer fails.
pub fn to_csv(products: &[Product]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADER)?;
    for product in products {
        let quantity = product.quantity.to_string();
        let price = product.price.to_string();
        writer.write_record([
            product.name.as_str(),
            product.category.as_str(),
            quantity.as_str(),
            price.as_str(),
            product.last_updated.as_str(),
        ])?;
    }

    let mut bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    // Lines are joined, not terminated: no newline after the last record.
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    String::from_utf8(bytes).map_err(|e| Error::Io(std::io::Error::other(e)))
}

/// A whitespace-only line shows up as a single blank field.
fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).is_some_and(|f| f.trim().is_empty())
}

fn row_from_record(record: &StringRecord, today: &str, line: u64) -> ImportedRow {
    let text = |index: usize, default: &str| {
        let value = record.get(index).map_or("", str::trim);
        if value.is_empty() {
            default.to_string()
        } else {
            value.to_string()
        }
    };

    ImportedRow {
        name: text(0, DEFAULT_NAME),
        category: text(1, DEFAULT_CATEGORY),
        quantity: parse_quantity(record.get(2), line),
        price: parse_price(record.get(3), line),
        last_updated: text(4, today),
    }
}

/// Read a numeric cell. Empty or unparseable cells read as zero.
fn parse_number(cell: Option<&str>) -> f64 {
    let cell = cell.map_or("", str::trim);
    if cell.is_empty() {
        return 0.0;
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

fn parse_quantity(cell: Option<&str>, line: u64) -> u32 {
    let value = parse_number(cell);
    if value < 0.0 {
        warn!("Line {}: negative quantity {} read as 0", line, value);
    } else if value.fract() != 0.0 {
        warn!("Line {}: fractional quantity {} truncated", line, value);
    }
    whole_quantity(value)
}

fn parse_price(cell: Option<&str>, line: u64) -> f64 {
    let value = parse_number(cell);
    if value < 0.0 {
        warn!("Line {}: negative price {} read as 0", line, value);
        return 0.0;
    }
    value
}
