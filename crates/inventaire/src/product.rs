//! Product record model.
//!
//! A [`Product`] is one inventory line item. The serialized form uses
//! camelCase keys (`lastUpdated`) so the persisted slot stays readable by
//! anything that wrote the same JSON layout.

use std::collections::HashSet;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::{Error, Result};

/// Unique identifier of a product within the collection.
pub type ProductId = u64;

/// Default display format for `last_updated` (day/month/year).
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// One inventory line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Identifier assigned at creation, never changed afterwards.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Free-form category.
    pub category: String,
    /// Count on hand.
    pub quantity: u32,
    /// Unit price in the configured currency.
    pub price: f64,
    /// Display date of the last creation or edit.
    pub last_updated: String,
}

impl Product {
    /// Build a product from validated draft fields.
    #[must_use]
    pub fn from_draft(id: ProductId, draft: ProductDraft, last_updated: String) -> Self {
        Self {
            id,
            name: draft.name,
            category: draft.category,
            quantity: draft.quantity,
            price: draft.price,
            last_updated,
        }
    }

    /// Replace every field except `id` with the draft's values.
    pub fn apply(&mut self, draft: ProductDraft, last_updated: String) {
        self.name = draft.name;
        self.category = draft.category;
        self.quantity = draft.quantity;
        self.price = draft.price;
        self.last_updated = last_updated;
    }

    /// Stock value of this line (`quantity * price`).
    #[must_use]
    pub fn value(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }

    /// Case-insensitive substring match on name or category.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.category.to_lowercase().contains(needle)
    }

    /// The editable fields of this product as a draft.
    #[must_use]
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            category: self.category.clone(),
            quantity: self.quantity,
            price: self.price,
        }
    }
}

/// User-entered field values submitted to add/update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Display name.
    pub name: String,
    /// Free-form category.
    pub category: String,
    /// Count on hand.
    pub quantity: u32,
    /// Unit price.
    pub price: f64,
}

impl ProductDraft {
    /// Create a draft from raw field values.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: u32,
        price: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            quantity,
            price,
        }
    }

    /// Validate the draft, returning it with trimmed text fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDraft`] if the name or category is blank, or
    /// if the price is negative or not a finite number.
    pub fn validate(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::invalid_draft("name", "must not be empty"));
        }

        let category = self.category.trim().to_string();
        if category.is_empty() {
            return Err(Error::invalid_draft("category", "must not be empty"));
        }

        if !self.price.is_finite() {
            return Err(Error::invalid_draft("price", "must be a number"));
        }
        if self.price < 0.0 {
            return Err(Error::invalid_draft("price", "must not be negative"));
        }

        Ok(Self {
            name,
            category,
            quantity: self.quantity,
            price: self.price,
        })
    }
}

/// A product as it appears in stored JSON, before its numbers are checked.
///
/// Earlier writers stored ids with a fractional offset and quantities as
/// arbitrary numbers, so both are read as plain JSON numbers here and
/// repaired by [`from_stored`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProduct {
    /// Identifier as written, possibly fractional.
    pub id: Number,
    /// Display name.
    pub name: String,
    /// Free-form category.
    pub category: String,
    /// Count on hand, possibly fractional or negative.
    pub quantity: Number,
    /// Unit price.
    pub price: f64,
    /// Display date of the last creation or edit.
    pub last_updated: String,
}

/// Products rebuilt from stored records.
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    /// The products in stored order.
    pub products: Vec<Product>,
    /// How many records got a fresh id.
    pub reassigned_ids: usize,
}

/// Rebuild products from stored records.
///
/// Whole, non-negative ids are kept. Fractional, negative and repeated ids
/// are replaced with ids counted on from the largest stored id, so the same
/// records always get the same replacements. Quantities are truncated to
/// whole counts and negative prices read as zero.
#[must_use]
pub fn from_stored(stored: Vec<StoredProduct>) -> Restored {
    let mut ids = IdAllocator::default();
    let mut seen = HashSet::new();
    let kept: Vec<Option<ProductId>> = stored
        .iter()
        .map(|record| {
            let (id, whole) = split_id(&record.id)?;
            ids.observe(id);
            (whole && seen.insert(id)).then_some(id)
        })
        .collect();

    let mut reassigned_ids = 0;
    let mut products = Vec::with_capacity(stored.len());

    for (record, id) in stored.into_iter().zip(kept) {
        let id = if let Some(id) = id {
            id
        } else {
            reassigned_ids += 1;
            ids.next_sequential()
        };
        let price = if record.price.is_finite() && record.price > 0.0 {
            record.price
        } else {
            0.0
        };

        products.push(Product {
            id,
            name: record.name,
            category: record.category,
            quantity: whole_quantity(record.quantity.as_f64().unwrap_or(0.0)),
            price,
            last_updated: record.last_updated,
        });
    }

    Restored {
        products,
        reassigned_ids,
    }
}

/// Truncate `value` to a count on hand. Negative and non-finite values read
/// as zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn whole_quantity(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    // Positive and clamped to u32::MAX, so the cast cannot wrap.
    value.trunc().min(f64::from(u32::MAX)) as u32
}

/// The whole part of a stored id and whether the id had no fractional part.
///
/// Negative ids and ids past the exact range of `f64` have no usable part.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn split_id(n: &Number) -> Option<(ProductId, bool)> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    if let Some(id) = n.as_u64() {
        return Some((id, true));
    }
    let value = n.as_f64()?;
    (value >= 0.0 && value < MAX_EXACT).then(|| (value.trunc() as ProductId, value.fract() == 0.0))
}

/// Hands out product identifiers.
///
/// Ids are the current Unix time in milliseconds, bumped past the last id
/// handed out, so they stay unique even when many records are created within
/// the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: ProductId,
}

impl IdAllocator {
    /// Create an allocator that never reuses an id from `products`.
    #[must_use]
    pub fn seeded_from(products: &[Product]) -> Self {
        Self {
            last: products.iter().map(|p| p.id).max().unwrap_or(0),
        }
    }

    /// Allocate the next id using the current time.
    pub fn next_id(&mut self) -> ProductId {
        self.next_id_at(Utc::now())
    }

    /// Allocate the next id as of `now`.
    pub fn next_id_at(&mut self, now: DateTime<Utc>) -> ProductId {
        let millis = ProductId::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = millis.max(self.last.saturating_add(1));
        self.last = id;
        id
    }

    /// Note an id that entered the collection from elsewhere.
    pub fn observe(&mut self, id: ProductId) {
        self.last = self.last.max(id);
    }

    /// Allocate the id right after the last one, ignoring the clock.
    fn next_sequential(&mut self) -> ProductId {
        self.last = self.last.saturating_add(1);
        self.last
    }
}

/// Render `when` with a chrono strftime `format`.
#[must_use]
pub fn format_date<Tz: TimeZone>(when: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    when.format(format).to_string()
}

/// Today's display date in the local timezone.
#[must_use]
pub fn today(format: &str) -> String {
    format_date(&Local::now(), format)
}

/// Check that a strftime format string only contains valid specifiers.
#[must_use]
pub fn is_valid_date_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: ProductId) -> Product {
        Product {
            id,
            name: "Clavier".to_string(),
            category: "Informatique".to_string(),
            quantity: 3,
            price: 12.5,
            last_updated: "01/02/2024".to_string(),
        }
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let json = serde_json::to_string(&sample(7)).unwrap();
        assert!(json.contains("\"lastUpdated\":\"01/02/2024\""));
        assert!(!json.contains("last_updated"));
    }

    #[test]
    fn test_product_deserializes_stored_layout() {
        let json = r#"{"id":1700000000000,"name":"Stylo","category":"Bureau","quantity":10,"price":0.5,"lastUpdated":"15/01/2024"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 1_700_000_000_000);
        assert_eq!(product.name, "Stylo");
        assert_eq!(product.last_updated, "15/01/2024");
    }

    #[test]
    fn test_product_value() {
        let product = sample(1);
        assert!((product.value() - 37.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_product_matches_name_or_category() {
        let product = sample(1);
        assert!(product.matches("clav"));
        assert!(product.matches("informa"));
        assert!(product.matches(""));
        assert!(!product.matches("souris"));
    }

    #[test]
    fn test_apply_keeps_id() {
        let mut product = sample(42);
        product.apply(
            ProductDraft::new("Souris", "Accessoires", 9, 4.0),
            "02/03/2024".to_string(),
        );
        assert_eq!(product.id, 42);
        assert_eq!(product.name, "Souris");
        assert_eq!(product.category, "Accessoires");
        assert_eq!(product.quantity, 9);
        assert_eq!(product.last_updated, "02/03/2024");
    }

    #[test]
    fn test_draft_validate_trims() {
        let draft = ProductDraft::new("  Vis  ", " Quincaillerie ", 100, 0.1)
            .validate()
            .unwrap();
        assert_eq!(draft.name, "Vis");
        assert_eq!(draft.category, "Quincaillerie");
    }

    #[test]
    fn test_draft_validate_rejects_blank_name() {
        let err = ProductDraft::new("   ", "Cat", 1, 1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDraft { field: "name", .. }));
    }

    #[test]
    fn test_draft_validate_rejects_blank_category() {
        let err = ProductDraft::new("Nom", "", 1, 1.0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidDraft { field: "category", .. }));
    }

    #[test]
    fn test_draft_validate_rejects_bad_price() {
        let err = ProductDraft::new("Nom", "Cat", 1, -0.01)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDraft { field: "price", .. }));

        let err = ProductDraft::new("Nom", "Cat", 1, f64::NAN)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDraft { field: "price", .. }));
    }

    #[test]
    fn test_allocator_uses_time() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let mut ids = IdAllocator::default();
        assert_eq!(ids.next_id_at(now), 1_700_000_000_123);
    }

    #[test]
    fn test_allocator_is_strictly_increasing_within_same_instant() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let mut ids = IdAllocator::default();
        let a = ids.next_id_at(now);
        let b = ids.next_id_at(now);
        let c = ids.next_id_at(now);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_allocator_seeded_past_existing_ids() {
        let existing = vec![sample(5), sample(9_999_999_999_999)];
        let mut ids = IdAllocator::seeded_from(&existing);
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        assert_eq!(ids.next_id_at(now), 10_000_000_000_000);
    }

    #[test]
    fn test_allocator_observe() {
        let mut ids = IdAllocator::default();
        ids.observe(50);
        let before_epoch = Utc.timestamp_millis_opt(0).unwrap();
        assert_eq!(ids.next_id_at(before_epoch), 51);
    }

    fn stored(json: &str) -> Vec<StoredProduct> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_from_stored_keeps_whole_ids() {
        let restored = from_stored(stored(
            r#"[{"id":1700000000000,"name":"Stylo","category":"Bureau","quantity":10,"price":0.5,"lastUpdated":"15/01/2024"}]"#,
        ));
        assert_eq!(restored.reassigned_ids, 0);
        assert_eq!(restored.products[0].id, 1_700_000_000_000);
        assert_eq!(restored.products[0].quantity, 10);
    }

    #[test]
    fn test_from_stored_replaces_fractional_ids() {
        let restored = from_stored(stored(
            r#"[
                {"id":1700000000000,"name":"A","category":"X","quantity":1,"price":1,"lastUpdated":"d"},
                {"id":1700000000123.4567,"name":"B","category":"X","quantity":2,"price":1,"lastUpdated":"d"},
                {"id":1700000000000,"name":"C","category":"X","quantity":3,"price":1,"lastUpdated":"d"}
            ]"#,
        ));

        assert_eq!(restored.reassigned_ids, 2);
        let ids: Vec<_> = restored.products.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            [1_700_000_000_000, 1_700_000_000_124, 1_700_000_000_125]
        );
        assert_eq!(restored.products[1].name, "B");
        assert_eq!(restored.products[2].name, "C");
    }

    #[test]
    fn test_from_stored_is_deterministic() {
        let json = r#"[{"id":12.5,"name":"A","category":"X","quantity":1,"price":1,"lastUpdated":"d"},
                       {"id":-3,"name":"B","category":"X","quantity":1,"price":1,"lastUpdated":"d"}]"#;
        let first = from_stored(stored(json));
        let second = from_stored(stored(json));
        assert_eq!(first, second);
        let ids: Vec<_> = first.products.iter().map(|p| p.id).collect();
        assert_eq!(ids, [13, 14]);
    }

    #[test]
    fn test_from_stored_accepts_float_written_whole_ids() {
        let restored = from_stored(stored(
            r#"[{"id":42.0,"name":"A","category":"X","quantity":1,"price":1,"lastUpdated":"d"}]"#,
        ));
        assert_eq!(restored.reassigned_ids, 0);
        assert_eq!(restored.products[0].id, 42);
    }

    #[test]
    fn test_from_stored_repairs_numbers() {
        let restored = from_stored(stored(
            r#"[
                {"id":1,"name":"A","category":"X","quantity":2.75,"price":-4,"lastUpdated":"d"},
                {"id":2,"name":"B","category":"X","quantity":-1,"price":3.5,"lastUpdated":"d"}
            ]"#,
        ));
        assert_eq!(restored.products[0].quantity, 2);
        assert!(restored.products[0].price.abs() < f64::EPSILON);
        assert_eq!(restored.products[1].quantity, 0);
        assert!((restored.products[1].price - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_whole_quantity() {
        assert_eq!(whole_quantity(3.9), 3);
        assert_eq!(whole_quantity(-2.0), 0);
        assert_eq!(whole_quantity(f64::NAN), 0);
        assert_eq!(whole_quantity(1e20), u32::MAX);
    }

    #[test]
    fn test_format_date() {
        let when = Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap();
        assert_eq!(format_date(&when, DEFAULT_DATE_FORMAT), "09/03/2024");
        assert_eq!(format_date(&when, "%Y-%m-%d"), "2024-03-09");
    }

    #[test]
    fn test_is_valid_date_format() {
        assert!(is_valid_date_format(DEFAULT_DATE_FORMAT));
        assert!(is_valid_date_format("%Y-%m-%d"));
        assert!(!is_valid_date_format("%Q"));
    }
}
