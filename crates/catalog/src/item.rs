use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pharmabill_core::error::{require_range, require_text};
use pharmabill_core::{CatalogItemId, DomainError, DomainResult, Entity};

/// GST slabs applicable to medicines and related goods.
pub const GST_RATE_SLABS: [u32; 5] = [0, 5, 12, 18, 28];

/// GST rate pre-selected for a new catalog item.
pub const DEFAULT_GST_PERCENT: u32 = 12;

/// Items with stock strictly below this are reported as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Maximum number of results the billing picker shows.
pub const PICKER_RESULT_LIMIT: usize = 10;

/// Highest per-unit rate or MRP accepted (₹1 crore).
pub const MAX_RATE: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

/// Highest billed or free quantity accepted on one invoice line.
pub const MAX_LINE_QTY: i64 = 1_000_000;

/// Editable fields of a catalog item (the "add / edit medicine" form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItemDetails {
    pub name: String,
    /// Pack description, e.g. "15 Tabs".
    pub packing: String,
    pub batch_no: String,
    /// Expiry marker as printed on the pack (`MM/YY` or `YYYY-MM-DD`).
    pub expiry: String,
    pub hsn: String,
    #[serde(default)]
    pub manufacturer: String,
    pub mrp: Decimal,
    /// Wholesale rate per unit.
    pub rate: Decimal,
    pub gst_percent: Decimal,
    pub stock: i64,
}

impl Default for CatalogItemDetails {
    fn default() -> Self {
        Self {
            name: String::new(),
            packing: String::new(),
            batch_no: String::new(),
            expiry: String::new(),
            hsn: String::new(),
            manufacturer: String::new(),
            mrp: Decimal::ZERO,
            rate: Decimal::ZERO,
            gst_percent: Decimal::from(DEFAULT_GST_PERCENT),
            stock: 0,
        }
    }
}

impl CatalogItemDetails {
    /// Trim text fields and upper-case the batch number.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            packing: self.packing.trim().to_string(),
            batch_no: self.batch_no.trim().to_uppercase(),
            expiry: self.expiry.trim().to_string(),
            hsn: self.hsn.trim().to_string(),
            manufacturer: self.manufacturer.trim().to_string(),
            ..self
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("packing", &self.packing)?;
        require_text("batch_no", &self.batch_no)?;
        require_text("expiry", &self.expiry)?;
        require_text("hsn", &self.hsn)?;

        require_range("mrp", self.mrp, Decimal::ZERO, MAX_RATE)?;
        require_range("rate", self.rate, Decimal::ZERO, MAX_RATE)?;
        require_range("gst_percent", self.gst_percent, Decimal::ZERO, Decimal::ONE_HUNDRED)?;
        if self.stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        Ok(())
    }

    /// Whether the GST rate is one of the standard slabs.
    pub fn has_standard_gst_slab(&self) -> bool {
        GST_RATE_SLABS
            .iter()
            .any(|slab| Decimal::from(*slab) == self.gst_percent)
    }
}

/// A medicine in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    id: CatalogItemId,
    details: CatalogItemDetails,
}

impl CatalogItem {
    /// Build a new catalog item from form input (normalized, then validated).
    pub fn create(id: CatalogItemId, details: CatalogItemDetails) -> DomainResult<Self> {
        let details = details.normalized();
        details.validate()?;
        Ok(Self { id, details })
    }

    pub fn id_typed(&self) -> CatalogItemId {
        self.id
    }

    pub fn details(&self) -> &CatalogItemDetails {
        &self.details
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn batch_no(&self) -> &str {
        &self.details.batch_no
    }

    pub fn hsn(&self) -> &str {
        &self.details.hsn
    }

    pub fn rate(&self) -> Decimal {
        self.details.rate
    }

    pub fn gst_percent(&self) -> Decimal {
        self.details.gst_percent
    }

    pub fn stock(&self) -> i64 {
        self.details.stock
    }

    /// Replace all editable fields. On failure the item is left unchanged.
    pub fn update(&mut self, details: CatalogItemDetails) -> DomainResult<()> {
        let details = details.normalized();
        details.validate()?;
        self.details = details;
        Ok(())
    }

    /// Add `delta` to the on-hand stock and return the new level.
    ///
    /// Sales may take stock below zero; the negative level is kept so the
    /// shortfall stays visible.
    pub fn apply_stock_delta(&mut self, delta: i64) -> i64 {
        self.details.stock = self.details.stock.saturating_add(delta);
        self.details.stock
    }

    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.details.stock < threshold
    }

    /// Catalog screen search: name or batch (case-insensitive), or HSN substring.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let lower = query.to_lowercase();
        self.details.name.to_lowercase().contains(&lower)
            || self.details.batch_no.to_lowercase().contains(&lower)
            || self.details.hsn.contains(query)
    }

    /// Billing picker search: name only, and an empty query matches nothing.
    pub fn matches_picker(&self, query: &str) -> bool {
        !query.is_empty()
            && self
                .details
                .name
                .to_lowercase()
                .contains(&query.to_lowercase())
    }
}

impl Entity for CatalogItem {
    type Id = CatalogItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dolo() -> CatalogItemDetails {
        CatalogItemDetails {
            name: "Dolo 650mg".to_string(),
            packing: "15 Tabs".to_string(),
            batch_no: "db2041".to_string(),
            expiry: "08/27".to_string(),
            hsn: "30049099".to_string(),
            manufacturer: "Micro Labs".to_string(),
            mrp: dec!(33.60),
            rate: dec!(24.00),
            gst_percent: dec!(12),
            stock: 40,
        }
    }

    #[test]
    fn create_normalizes_batch_number() {
        let item = CatalogItem::create(CatalogItemId::new(), dolo()).unwrap();
        assert_eq!(item.batch_no(), "DB2041");
    }

    #[test]
    fn create_rejects_missing_required_fields() {
        for field in ["name", "packing", "batch_no", "expiry", "hsn"] {
            let mut details = dolo();
            match field {
                "name" => details.name = " ".to_string(),
                "packing" => details.packing.clear(),
                "batch_no" => details.batch_no.clear(),
                "expiry" => details.expiry.clear(),
                _ => details.hsn.clear(),
            }
            let err = CatalogItem::create(CatalogItemId::new(), details).unwrap_err();
            match err {
                DomainError::Validation(msg) if msg.starts_with(field) => {}
                other => panic!("expected validation error for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn manufacturer_is_optional() {
        let mut details = dolo();
        details.manufacturer.clear();
        assert!(CatalogItem::create(CatalogItemId::new(), details).is_ok());
    }

    #[test]
    fn create_rejects_negative_amounts() {
        let mut details = dolo();
        details.rate = dec!(-1);
        assert!(CatalogItem::create(CatalogItemId::new(), details).is_err());

        let mut details = dolo();
        details.stock = -5;
        assert!(CatalogItem::create(CatalogItemId::new(), details).is_err());
    }

    #[test]
    fn create_rejects_amounts_above_the_limits() {
        let mut details = dolo();
        details.rate = MAX_RATE + dec!(1);
        assert!(CatalogItem::create(CatalogItemId::new(), details).is_err());

        let mut details = dolo();
        details.gst_percent = dec!(101);
        assert!(CatalogItem::create(CatalogItemId::new(), details).is_err());

        let mut details = dolo();
        details.rate = MAX_RATE;
        details.mrp = MAX_RATE;
        assert!(CatalogItem::create(CatalogItemId::new(), details).is_ok());
    }

    #[test]
    fn failed_update_leaves_item_unchanged() {
        let mut item = CatalogItem::create(CatalogItemId::new(), dolo()).unwrap();
        let before = item.clone();

        let mut bad = dolo();
        bad.name.clear();
        assert!(item.update(bad).is_err());
        assert_eq!(item, before);
    }

    #[test]
    fn stock_delta_may_go_negative() {
        let mut details = dolo();
        details.stock = 2;
        let mut item = CatalogItem::create(CatalogItemId::new(), details).unwrap();

        assert_eq!(item.apply_stock_delta(-3), -1);
        assert!(item.is_low_stock(DEFAULT_LOW_STOCK_THRESHOLD));
    }

    #[test]
    fn low_stock_threshold_is_exclusive() {
        let mut details = dolo();
        details.stock = 10;
        let item = CatalogItem::create(CatalogItemId::new(), details).unwrap();
        assert!(!item.is_low_stock(10));
        assert!(item.is_low_stock(11));
    }

    #[test]
    fn search_matches_name_batch_and_hsn() {
        let item = CatalogItem::create(CatalogItemId::new(), dolo()).unwrap();
        assert!(item.matches_search(""));
        assert!(item.matches_search("DOLO"));
        assert!(item.matches_search("db20"));
        assert!(item.matches_search("3004"));
        assert!(!item.matches_search("crocin"));
    }

    #[test]
    fn picker_requires_a_query() {
        let item = CatalogItem::create(CatalogItemId::new(), dolo()).unwrap();
        assert!(!item.matches_picker(""));
        assert!(item.matches_picker("dolo"));
        assert!(!item.matches_picker("DB2041"));
    }

    #[test]
    fn default_details_use_twelve_percent_gst() {
        let details = CatalogItemDetails::default();
        assert_eq!(details.gst_percent, dec!(12));
        assert!(details.has_standard_gst_slab());
    }
}
