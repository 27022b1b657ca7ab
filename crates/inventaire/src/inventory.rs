//! Inventory controller.
//!
//! [`Inventory`] owns the product collection. It loads it once when opened
//! and saves the whole collection after every successful mutation. A failed
//! save is reported to the caller but the mutation stays applied in memory.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::Result;
use crate::persistence::{self, BackupEnvelope, Persistence};
use crate::product::{self, IdAllocator, Product, ProductDraft, ProductId};
use crate::storage::SlotStore;

/// Aggregates derived from the collection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Totals {
    /// Number of distinct products.
    pub total_products: usize,
    /// Sum of all quantities.
    pub total_items: u64,
    /// Sum of `quantity * price` over all products.
    pub total_value: f64,
}

impl Totals {
    /// Compute the aggregates of `products`.
    #[must_use]
    pub fn of(products: &[Product]) -> Self {
        Self {
            total_products: products.len(),
            total_items: products.iter().map(|p| u64::from(p.quantity)).sum(),
            total_value: products.iter().map(Product::value).sum(),
        }
    }
}

/// The in-memory product collection and the operations on it.
#[derive(Debug)]
pub struct Inventory<S> {
    persistence: Persistence<S>,
    products: Vec<Product>,
    ids: IdAllocator,
    date_format: String,
}

impl<S: SlotStore> Inventory<S> {
    /// Load the collection from `persistence`.
    ///
    /// Unreadable or corrupt data is logged and treated as an empty
    /// collection. `date_format` renders `last_updated` values.
    pub fn open(persistence: Persistence<S>, date_format: impl Into<String>) -> Self {
        let products = persistence.load_or_empty();
        info!(
            "Loaded {} products from slot {}",
            products.len(),
            persistence.key()
        );

        let ids = IdAllocator::seeded_from(&products);
        Self {
            persistence,
            products,
            ids,
            date_format: date_format.into(),
        }
    }

    /// The collection in insertion order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// The persistence service backing this inventory.
    #[must_use]
    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Products whose name or category contains `term`, ignoring case.
    ///
    /// An empty term matches everything. Order is preserved.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Product> {
        let needle = term.to_lowercase();
        self.products.iter().filter(|p| p.matches(&needle)).collect()
    }

    /// Aggregates over the whole collection.
    #[must_use]
    pub fn totals(&self) -> Totals {
        Totals::of(&self.products)
    }

    /// Add a product built from `draft`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDraft`](crate::Error::InvalidDraft) without
    /// changing anything if the draft is invalid, or
    /// [`Error::StorageWrite`](crate::Error::StorageWrite) if the product
    /// was added but could not be saved.
    pub fn add(&mut self, draft: ProductDraft) -> Result<Product> {
        let draft = draft.validate()?;
        let product = Product::from_draft(self.ids.next_id(), draft, self.today());
        debug!("Adding product {} ({})", product.id, product.name);

        self.products.push(product.clone());
        self.save()?;
        Ok(product)
    }

    /// Replace every field of product `id` except the id itself.
    ///
    /// Returns `None` without saving if no product has that id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDraft`](crate::Error::InvalidDraft) without
    /// changing anything if the draft is invalid, or
    /// [`Error::StorageWrite`](crate::Error::StorageWrite) if the product
    /// was updated but could not be saved.
    pub fn update(&mut self, id: ProductId, draft: ProductDraft) -> Result<Option<Product>> {
        let draft = draft.validate()?;
        let today = self.today();

        let Some(product) = self.products.iter_mut().find(|p| p.id == id) else {
            debug!("Update of unknown product {} ignored", id);
            return Ok(None);
        };
        product.apply(draft, today);
        let updated = product.clone();

        self.save()?;
        Ok(Some(updated))
    }

    /// Remove product `id`.
    ///
    /// Callers are expected to have confirmed the deletion with the user.
    /// Returns `false` without saving if no product has that id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`](crate::Error::StorageWrite) if the
    /// product was removed but the collection could not be saved.
    pub fn delete(&mut self, id: ProductId) -> Result<bool> {
        let Some(index) = self.products.iter().position(|p| p.id == id) else {
            debug!("Delete of unknown product {} ignored", id);
            return Ok(false);
        };

        let removed = self.products.remove(index);
        debug!("Deleted product {} ({})", removed.id, removed.name);
        self.save()?;
        Ok(true)
    }

    /// Append every row of a CSV file to the collection.
    ///
    /// The whole import is abandoned if the text cannot be parsed. Returns
    /// the number of products added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImportParse`](crate::Error::ImportParse) if the
    /// text is not importable, or
    /// [`Error::StorageWrite`](crate::Error::StorageWrite) if the rows were
    /// added but could not be saved.
    pub fn import_csv(&mut self, text: &str) -> Result<usize> {
        let rows = codec::parse(text, &self.today())?;
        let count = rows.len();

        for row in rows {
            let id = self.ids.next_id();
            self.products.push(row.into_product(id));
        }

        info!("Imported {} products from CSV", count);
        self.save()?;
        Ok(count)
    }

    /// The collection as CSV text.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV writer fails.
    pub fn export_csv(&self) -> Result<String> {
        codec::to_csv(&self.products)
    }

    /// A JSON backup of the collection taken at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackupCreation`](crate::Error::BackupCreation) if
    /// the backup cannot be serialized.
    pub fn backup(&self, now: DateTime<Utc>) -> Result<Vec<u8>> {
        persistence::create_backup_blob(&self.products, now)
    }

    /// Append the products of a backup under fresh ids.
    ///
    /// Returns the number of products added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`](crate::Error::StorageWrite) if the
    /// products were added but could not be saved.
    pub fn restore(&mut self, envelope: BackupEnvelope) -> Result<usize> {
        let count = envelope.data.len();
        for mut product in envelope.data {
            product.id = self.ids.next_id();
            self.products.push(product);
        }

        info!(
            "Restored {} products from backup taken at {}",
            count, envelope.timestamp
        );
        self.save()?;
        Ok(count)
    }

    fn save(&mut self) -> Result<()> {
        if let Err(e) = self.persistence.save(&self.products) {
            warn!("In-memory changes not saved: {}", e);
            return Err(e);
        }
        Ok(())
    }

    fn today(&self) -> String {
        product::today(&self.date_format)
    }
}
